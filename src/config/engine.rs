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
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::audio::Audio;
use super::driver::Driver;
use super::mapping::Mapping;
use super::sounds::Sounds;

/// The configuration for the hum engine.
#[derive(Deserialize, Clone, Debug)]
pub struct Engine {
    /// The audio output configuration.
    audio: Audio,
    /// The sound files to play.
    sounds: Sounds,
    /// Tunables for the sensor mapping.
    #[serde(default)]
    mapping: Mapping,
    /// Where sensor samples come from.
    #[serde(default)]
    driver: Driver,
    /// The directory relative paths are resolved against.
    #[serde(skip)]
    base_path: PathBuf,
}

impl Engine {
    /// Creates a new engine configuration with default mapping and driver.
    pub fn new(audio: Audio, sounds: Sounds) -> Engine {
        Engine {
            audio,
            sounds,
            mapping: Mapping::default(),
            driver: Driver::default(),
            base_path: PathBuf::new(),
        }
    }

    /// Anchors the configuration at the given directory, resolving relative sound paths.
    pub fn with_base_path(mut self, base_path: &Path) -> Engine {
        self.sounds = self.sounds.resolve(base_path);
        self.base_path = base_path.to_path_buf();
        self
    }

    /// Returns the audio configuration.
    pub fn audio(&self) -> &Audio {
        &self.audio
    }

    /// Returns the sound files.
    pub fn sounds(&self) -> &Sounds {
        &self.sounds
    }

    /// Returns the mapping tunables.
    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// Returns the driver configuration.
    pub fn driver(&self) -> &Driver {
        &self.driver
    }

    /// Returns the directory relative paths are resolved against.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}
