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
use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use crate::{controller, playback::PlaybackController, registry::VoiceRegistry};

mod audio;
mod driver;
mod engine;
mod error;
mod mapping;
mod sounds;
mod trace;

pub use self::audio::Audio;
pub use self::driver::Driver;
pub use self::engine::Engine;
pub use self::error::ConfigError;
pub use self::mapping::{Mapping, TriggerMode};
pub use self::sounds::Sounds;
pub use self::trace::{Lifecycle, Trace, TraceStep};

/// Parses an engine configuration from a YAML file. Relative paths inside it are
/// resolved against the directory containing the file.
pub fn parse_engine(path: &Path) -> Result<Engine, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let engine: Engine = ::config::Config::builder()
        .add_source(::config::File::from_str(
            &contents,
            ::config::FileFormat::Yaml,
        ))
        .build()?
        .try_deserialize()?;
    engine.mapping().validate()?;

    let base_path = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    Ok(engine.with_base_path(&base_path))
}

/// Parses a recorded sensor trace from a YAML file.
pub fn parse_trace(path: &Path) -> Result<Trace, ConfigError> {
    Ok(serde_yml::from_str(&fs::read_to_string(path)?)?)
}

/// Initializes the audio device, voice registry, playback controller and controller
/// from the given engine config. If a driver is given, it replaces the configured one.
/// The controller owns the playback controller and runs until its driver closes.
pub fn init_controller(
    engine_path: &Path,
    driver: Option<Arc<dyn controller::Driver>>,
) -> Result<controller::Controller, Box<dyn Error>> {
    let engine = parse_engine(engine_path)?;
    info!(
        config = engine_path.display().to_string(),
        device = engine.audio().device(),
        "Initializing hum engine."
    );

    let (ready_tx, ready_rx) = mpsc::unbounded_channel();
    let device = crate::audio::get_device(engine.audio(), ready_tx)?;
    let registry = VoiceRegistry::new(device, engine.audio().max_voices());
    let playback = PlaybackController::new(registry, engine.sounds().clone(), engine.mapping());

    let driver = match driver {
        Some(driver) => driver,
        None => engine.driver().driver(engine.base_path())?,
    };

    controller::Controller::new(playback, driver, ready_rx)
}
