use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::RegistryError;

pub fn field_key(channel: &str, field_name: &str) -> String {
    format!("{}/{}", channel, field_name)
}

/// What a user asks to plot: one field of the messages on one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FieldSpec {
    pub channel: String,
    /// Message type of the channel, e.g. `float` or `ctd_t`.
    pub type_descriptor: String,
    /// Field to project out of each message; dotted paths reach nested fields.
    pub field_name: String,
    pub sample_rate_hz: f64,
    pub display_name: String,
    #[serde(default = "default_layer_enabled")]
    pub layer_enabled: bool,
}

fn default_layer_enabled() -> bool {
    true
}

impl FieldSpec {
    pub fn key(&self) -> String {
        field_key(&self.channel, &self.field_name)
    }

    pub fn validate(&self) -> Result<(), RegistryError> {
        let blank = |name: &str, value: &str| {
            if value.trim().is_empty() {
                Err(RegistryError::InvalidField(format!("{} must not be empty", name)))
            } else {
                Ok(())
            }
        };
        blank("channel", &self.channel)?;
        blank("type descriptor", &self.type_descriptor)?;
        blank("field name", &self.field_name)?;
        blank("display name", &self.display_name)?;

        if !(self.sample_rate_hz.is_finite() && self.sample_rate_hz > 0.0) {
            return Err(RegistryError::InvalidField(format!(
                "sample rate must be a positive number of Hz, got {}",
                self.sample_rate_hz
            )));
        }
        Ok(())
    }
}

/// A registered field.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Field {
    pub key: String,
    #[serde(flatten)]
    pub spec: FieldSpec,
}

impl Field {
    pub fn channel(&self) -> &str {
        &self.spec.channel
    }

    pub fn display_name(&self) -> &str {
        &self.spec.display_name
    }

    pub fn sample_rate_hz(&self) -> f64 {
        self.spec.sample_rate_hz
    }
}
