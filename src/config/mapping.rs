// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use serde::Deserialize;

use super::error::ConfigError;
use crate::mapping::{motion, proximity};

/// How a threshold crossing turns into impacts.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TriggerMode {
    /// Every sample past the threshold triggers.
    #[default]
    Level,
    /// Only the first sample of each excursion past the threshold triggers.
    Edge,
}

/// Tunables for the sensor-to-audio mapping. Everything is optional and falls
/// back to the built-in calibration.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Mapping {
    /// Squared z angular velocity above which a swing counts as an impact.
    impact_threshold: Option<f32>,

    /// Divisor turning squared angular velocity into a roughly 0..1 strength.
    normalizer: Option<f32>,

    /// Distance below which the proximity sensor counts as an impact.
    proximity_threshold: Option<f32>,

    /// Trigger discipline for proximity impacts.
    #[serde(default)]
    proximity_trigger: TriggerMode,
}

impl Mapping {
    /// Returns the swing impact threshold.
    pub fn impact_threshold(&self) -> f32 {
        self.impact_threshold.unwrap_or(motion::IMPACT_THRESHOLD)
    }

    /// Returns the strength normalizer.
    pub fn normalizer(&self) -> f32 {
        self.normalizer.unwrap_or(motion::NORMALIZER)
    }

    /// Returns the proximity impact threshold.
    pub fn proximity_threshold(&self) -> f32 {
        self.proximity_threshold
            .unwrap_or(proximity::PROXIMITY_THRESHOLD)
    }

    /// Returns the proximity trigger mode.
    pub fn proximity_trigger(&self) -> TriggerMode {
        self.proximity_trigger
    }

    /// Rejects tunables that would push the hum parameters out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let normalizer = self.normalizer();
        if !normalizer.is_finite() || normalizer <= 0.0 {
            return Err(ConfigError::InvalidMapping(format!(
                "normalizer must be positive, got {}",
                normalizer
            )));
        }
        for (name, threshold) in [
            ("impact_threshold", self.impact_threshold()),
            ("proximity_threshold", self.proximity_threshold()),
        ] {
            if !threshold.is_finite() {
                return Err(ConfigError::InvalidMapping(format!(
                    "{} must be finite, got {}",
                    name, threshold
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use config::{Config, File, FileFormat};

    use super::*;

    #[test]
    fn test_mapping_defaults() {
        let mapping = Mapping::default();
        assert_eq!(mapping.impact_threshold(), 150.0);
        assert_eq!(mapping.normalizer(), 145.0);
        assert_eq!(mapping.proximity_threshold(), 1.0);
        assert_eq!(mapping.proximity_trigger(), TriggerMode::Level);
    }

    #[test]
    fn test_mapping_deserialize() {
        let yaml = r#"
            impact_threshold: 200.0
            proximity_trigger: edge
        "#;

        let mapping: Mapping = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(mapping.impact_threshold(), 200.0);
        assert_eq!(mapping.normalizer(), 145.0);
        assert_eq!(mapping.proximity_trigger(), TriggerMode::Edge);
        assert!(mapping.validate().is_ok());
    }

    #[test]
    fn test_mapping_rejects_bad_normalizer() {
        for yaml in ["normalizer: 0.0", "normalizer: -145.0"] {
            let mapping: Mapping = Config::builder()
                .add_source(File::from_str(yaml, FileFormat::Yaml))
                .build()
                .unwrap()
                .try_deserialize()
                .unwrap();

            assert!(
                matches!(mapping.validate(), Err(ConfigError::InvalidMapping(_))),
                "{} was accepted",
                yaml
            );
        }
        assert!(Mapping::default().validate().is_ok());
    }
}
