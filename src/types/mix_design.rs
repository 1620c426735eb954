//! Mix design data structures for concrete strength prediction

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Number of features the regression model expects.
pub const FEATURE_COUNT: usize = 8;

/// One constituent of a mix design, in the order the model was trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixComponent {
    Cement,
    BlastFurnaceSlag,
    FlyAsh,
    Water,
    Superplasticizer,
    CoarseAggregate,
    FineAggregate,
    Age,
}

impl MixComponent {
    /// All components in model input order.
    pub const ALL: [MixComponent; FEATURE_COUNT] = [
        MixComponent::Cement,
        MixComponent::BlastFurnaceSlag,
        MixComponent::FlyAsh,
        MixComponent::Water,
        MixComponent::Superplasticizer,
        MixComponent::CoarseAggregate,
        MixComponent::FineAggregate,
        MixComponent::Age,
    ];

    /// Field name used in forms and JSON payloads.
    pub fn key(self) -> &'static str {
        match self {
            MixComponent::Cement => "cement",
            MixComponent::BlastFurnaceSlag => "blast_furnace_slag",
            MixComponent::FlyAsh => "fly_ash",
            MixComponent::Water => "water",
            MixComponent::Superplasticizer => "superplasticizer",
            MixComponent::CoarseAggregate => "coarse_aggregate",
            MixComponent::FineAggregate => "fine_aggregate",
            MixComponent::Age => "age",
        }
    }

    /// Human readable label including the unit.
    pub fn label(self) -> &'static str {
        match self {
            MixComponent::Cement => "Cement (kg/m³)",
            MixComponent::BlastFurnaceSlag => "Blast Furnace Slag (kg/m³)",
            MixComponent::FlyAsh => "Fly Ash (kg/m³)",
            MixComponent::Water => "Water (kg/m³)",
            MixComponent::Superplasticizer => "Superplasticizer (kg/m³)",
            MixComponent::CoarseAggregate => "Coarse Aggregate (kg/m³)",
            MixComponent::FineAggregate => "Fine Aggregate (kg/m³)",
            MixComponent::Age => "Age (days)",
        }
    }

    /// Default value shown in the form.
    pub fn default_value(self) -> f64 {
        match self {
            MixComponent::Cement => 300.0,
            MixComponent::BlastFurnaceSlag => 100.0,
            MixComponent::FlyAsh => 50.0,
            MixComponent::Water => 180.0,
            MixComponent::Superplasticizer => 5.0,
            MixComponent::CoarseAggregate => 1000.0,
            MixComponent::FineAggregate => 800.0,
            MixComponent::Age => 28.0,
        }
    }

    /// Smallest accepted value.
    pub fn min_value(self) -> f64 {
        match self {
            MixComponent::Age => 1.0,
            _ => 0.0,
        }
    }

    /// Whether the component is entered as a whole number.
    pub fn is_integer(self) -> bool {
        matches!(self, MixComponent::Age)
    }
}

impl fmt::Display for MixComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Raw mix design as submitted by a user. Absent fields are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MixDesignInput {
    /// Cement (kg/m³)
    #[serde(default)]
    pub cement: Option<f64>,

    /// Blast furnace slag (kg/m³)
    #[serde(default)]
    pub blast_furnace_slag: Option<f64>,

    /// Fly ash (kg/m³)
    #[serde(default)]
    pub fly_ash: Option<f64>,

    /// Water (kg/m³)
    #[serde(default)]
    pub water: Option<f64>,

    /// Superplasticizer (kg/m³)
    #[serde(default)]
    pub superplasticizer: Option<f64>,

    /// Coarse aggregate (kg/m³)
    #[serde(default)]
    pub coarse_aggregate: Option<f64>,

    /// Fine aggregate (kg/m³)
    #[serde(default)]
    pub fine_aggregate: Option<f64>,

    /// Age in days. Whole numbers only in JSON payloads.
    #[serde(default, with = "whole_days")]
    pub age: Option<f64>,
}

/// JSON form of the age field: an integer number of days.
mod whole_days {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(days: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        match days {
            Some(days) if days.fract() == 0.0 && days.abs() < i64::MAX as f64 => {
                Some(*days as i64).serialize(serializer)
            }
            other => other.serialize(serializer),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        Ok(Option::<i64>::deserialize(deserializer)?.map(|days| days as f64))
    }
}

impl MixDesignInput {
    /// Input pre-filled with the form defaults.
    pub fn with_defaults() -> Self {
        Self {
            cement: Some(MixComponent::Cement.default_value()),
            blast_furnace_slag: Some(MixComponent::BlastFurnaceSlag.default_value()),
            fly_ash: Some(MixComponent::FlyAsh.default_value()),
            water: Some(MixComponent::Water.default_value()),
            superplasticizer: Some(MixComponent::Superplasticizer.default_value()),
            coarse_aggregate: Some(MixComponent::CoarseAggregate.default_value()),
            fine_aggregate: Some(MixComponent::FineAggregate.default_value()),
            age: Some(MixComponent::Age.default_value()),
        }
    }

    /// Value of a single component, if present.
    pub fn get(&self, component: MixComponent) -> Option<f64> {
        match component {
            MixComponent::Cement => self.cement,
            MixComponent::BlastFurnaceSlag => self.blast_furnace_slag,
            MixComponent::FlyAsh => self.fly_ash,
            MixComponent::Water => self.water,
            MixComponent::Superplasticizer => self.superplasticizer,
            MixComponent::CoarseAggregate => self.coarse_aggregate,
            MixComponent::FineAggregate => self.fine_aggregate,
            MixComponent::Age => self.age,
        }
    }

    /// Set a single component. Age is truncated to whole days; non-finite
    /// values are kept as-is so validation rejects them.
    pub fn set(&mut self, component: MixComponent, value: Option<f64>) {
        match component {
            MixComponent::Cement => self.cement = value,
            MixComponent::BlastFurnaceSlag => self.blast_furnace_slag = value,
            MixComponent::FlyAsh => self.fly_ash = value,
            MixComponent::Water => self.water = value,
            MixComponent::Superplasticizer => self.superplasticizer = value,
            MixComponent::CoarseAggregate => self.coarse_aggregate = value,
            MixComponent::FineAggregate => self.fine_aggregate = value,
            MixComponent::Age => self.age = value.map(f64::trunc),
        }
    }

    /// Validate the submission.
    ///
    /// The range check and the presence check run independently, so a single
    /// submission can report both invalid and missing fields.
    pub fn validate(&self) -> Result<MixDesign, ValidationError> {
        let mut invalid = Vec::new();
        let mut missing = Vec::new();
        let mut values = [0.0; FEATURE_COUNT];

        for (slot, component) in values.iter_mut().zip(MixComponent::ALL) {
            match self.get(component) {
                None => missing.push(component),
                Some(value) if !value.is_finite() || value < component.min_value() => {
                    invalid.push(component)
                }
                Some(value) => *slot = value,
            }
        }

        if invalid.is_empty() && missing.is_empty() {
            Ok(MixDesign { values })
        } else {
            Err(ValidationError { invalid, missing })
        }
    }
}

/// A validated mix design: every component present and within bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MixDesign {
    values: [f64; FEATURE_COUNT],
}

impl MixDesign {
    pub fn get(&self, component: MixComponent) -> f64 {
        self.values[component as usize]
    }

    /// Values in model input order.
    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }
}

/// Rejected submission, listing out-of-range and absent components separately.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid mix design (invalid: {invalid:?}, missing: {missing:?})")]
pub struct ValidationError {
    pub invalid: Vec<MixComponent>,
    pub missing: Vec<MixComponent>,
}

impl ValidationError {
    pub fn has_invalid(&self) -> bool {
        !self.invalid.is_empty()
    }

    pub fn has_missing(&self) -> bool {
        !self.missing.is_empty()
    }

    /// One user-facing message per failed check.
    pub fn messages(&self) -> Vec<String> {
        let mut messages = Vec::with_capacity(2);
        if self.has_invalid() {
            messages.push("Please enter valid values for all features.".to_string());
        }
        if self.has_missing() {
            messages.push("Please enter values for all features.".to_string());
        }
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let design = MixDesignInput::with_defaults().validate().unwrap();

        assert_eq!(design.get(MixComponent::Cement), 300.0);
        assert_eq!(design.get(MixComponent::FineAggregate), 800.0);
        assert_eq!(design.get(MixComponent::Age), 28.0);
        assert_eq!(design.values().len(), FEATURE_COUNT);
    }

    #[test]
    fn test_negative_value_is_rejected() {
        let mut input = MixDesignInput::with_defaults();
        input.water = Some(-5.0);

        let err = input.validate().unwrap_err();
        assert_eq!(err.invalid, vec![MixComponent::Water]);
        assert!(err.missing.is_empty());
        assert_eq!(err.messages().len(), 1);
    }

    #[test]
    fn test_zero_age_is_rejected() {
        let mut input = MixDesignInput::with_defaults();
        input.age = Some(0.0);

        let err = input.validate().unwrap_err();
        assert_eq!(err.invalid, vec![MixComponent::Age]);
    }

    #[test]
    fn test_zero_masses_are_accepted() {
        let mut input = MixDesignInput::with_defaults();
        input.fly_ash = Some(0.0);
        input.blast_furnace_slag = Some(0.0);
        input.age = Some(1.0);

        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_non_finite_value_is_rejected() {
        let mut input = MixDesignInput::with_defaults();
        input.cement = Some(f64::NAN);

        let err = input.validate().unwrap_err();
        assert_eq!(err.invalid, vec![MixComponent::Cement]);
    }

    #[test]
    fn test_invalid_and_missing_both_reported() {
        let mut input = MixDesignInput::with_defaults();
        input.cement = Some(-1.0);
        input.superplasticizer = None;

        let err = input.validate().unwrap_err();
        assert!(err.has_invalid());
        assert!(err.has_missing());
        assert_eq!(err.missing, vec![MixComponent::Superplasticizer]);
        assert_eq!(
            err.messages(),
            vec![
                "Please enter valid values for all features.".to_string(),
                "Please enter values for all features.".to_string(),
            ]
        );
    }

    #[test]
    fn test_missing_fields_from_json() {
        let input: MixDesignInput = serde_json::from_str(r#"{"cement": 250.0, "age": 7}"#).unwrap();

        let err = input.validate().unwrap_err();
        assert_eq!(err.missing.len(), 6);
        assert!(!err.has_invalid());
    }

    #[test]
    fn test_set_truncates_age() {
        let mut input = MixDesignInput::default();
        input.set(MixComponent::Age, Some(14.9));
        assert_eq!(input.age, Some(14.0));
        assert_eq!(input.get(MixComponent::Age), Some(14.0));
    }

    #[test]
    fn test_infinite_age_is_rejected() {
        let mut input = MixDesignInput::with_defaults();
        input.set(MixComponent::Age, Some(f64::INFINITY));

        let err = input.validate().unwrap_err();
        assert_eq!(err.invalid, vec![MixComponent::Age]);

        input.set(MixComponent::Age, Some(f64::NAN));
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_age_must_be_an_integer_in_json() {
        let input: MixDesignInput = serde_json::from_str(r#"{"age": 7}"#).unwrap();
        assert_eq!(input.age, Some(7.0));
        assert!(serde_json::from_str::<MixDesignInput>(r#"{"age": 7.5}"#).is_err());

        let json = serde_json::to_value(MixDesignInput::with_defaults()).unwrap();
        assert_eq!(json["age"], serde_json::json!(28));
        assert_eq!(serde_json::from_value::<MixDesignInput>(json).unwrap().age, Some(28.0));
    }

    #[test]
    fn test_component_order_matches_index() {
        for (index, component) in MixComponent::ALL.iter().enumerate() {
            assert_eq!(*component as usize, index);
        }
    }
}
