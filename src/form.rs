//! Planting form model and validation

use crate::error::ValidationError;
use crate::types::PlantingRequest;

/// Raw form input. Numeric fields stay as text until submit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlantingForm {
    pub x: String,
    pub y: String,
    pub column_separation: String,
    pub seed_spacing: String,
    pub dispense_water: bool,
}

impl PlantingForm {
    /// Parse and validate into a request. Every numeric field must be a finite number > 0.
    pub fn validate(&self) -> Result<PlantingRequest, ValidationError> {
        Ok(PlantingRequest {
            x: positive("x", &self.x)?,
            y: positive("y", &self.y)?,
            column_separation: positive("columnSeparation", &self.column_separation)?,
            seed_spacing: positive("seedSpacing", &self.seed_spacing)?,
            dispense_water: self.dispense_water,
        })
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

fn positive(field: &'static str, raw: &str) -> Result<f64, ValidationError> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => Ok(value),
        _ => Err(ValidationError::NotPositive { field }),
    }
}
