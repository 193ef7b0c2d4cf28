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

/// Default number of concurrently sounding voices.
pub const DEFAULT_MAX_VOICES: usize = 4;

/// A YAML representation of the audio configuration.
#[derive(Deserialize, Clone, Debug)]
pub struct Audio {
    /// The audio device. Names starting with "mock" select the mock device.
    device: String,

    /// Output sample rate in Hz. Defaults to the device's preferred rate.
    sample_rate: Option<u32>,

    /// Maximum number of concurrently sounding voices (default: 4).
    max_voices: Option<usize>,
}

impl Audio {
    /// New will create a new Audio configuration.
    pub fn new(device: &str) -> Audio {
        Audio {
            device: device.to_string(),
            sample_rate: None,
            max_voices: None,
        }
    }

    /// Returns the device from the configuration.
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Returns the configured output sample rate, if any.
    pub fn sample_rate(&self) -> Option<u32> {
        self.sample_rate
    }

    /// Returns the voice pool capacity. Always at least 1.
    pub fn max_voices(&self) -> usize {
        self.max_voices.unwrap_or(DEFAULT_MAX_VOICES).max(1)
    }
}

#[cfg(test)]
mod tests {
    use config::{Config, File, FileFormat};

    use super::*;

    fn parse(yaml: &str) -> Audio {
        Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_audio_defaults() {
        let audio = Audio::new("mock-device");
        assert_eq!(audio.device(), "mock-device");
        assert_eq!(audio.sample_rate(), None);
        assert_eq!(audio.max_voices(), DEFAULT_MAX_VOICES);
    }

    #[test]
    fn test_audio_deserialize() {
        let audio = parse("device: UltraLite-mk5\nsample_rate: 48000\nmax_voices: 0\n");
        assert_eq!(audio.device(), "UltraLite-mk5");
        assert_eq!(audio.sample_rate(), Some(48000));
        // A pool needs at least one voice.
        assert_eq!(audio.max_voices(), 1);
    }
}
