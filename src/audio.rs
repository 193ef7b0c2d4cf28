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
use std::{error::Error, fmt, path::Path, sync::Arc};

use tokio::sync::mpsc::UnboundedSender;

use crate::config;

pub mod cpal;
pub mod decode;
pub mod error;
pub mod mixer;
pub mod mock;

pub use error::AudioError;

/// Identifies a sound asset that has been handed to a device for loading.
/// Asset IDs are never zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(u32);

impl AssetId {
    /// Creates an asset ID from its raw value.
    pub const fn new(id: u32) -> AssetId {
        AssetId(id)
    }

    /// Returns the raw value of the asset ID.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "asset#{}", self.0)
    }
}

/// Identifies a single playing instance of a sound. `VoiceId::NONE` is the
/// "not playing" sentinel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct VoiceId(u64);

impl VoiceId {
    /// The sentinel for "no voice".
    pub const NONE: VoiceId = VoiceId(0);

    /// Creates a voice ID from its raw value.
    pub const fn new(id: u64) -> VoiceId {
        VoiceId(id)
    }

    /// Returns true if this is the "no voice" sentinel.
    pub fn is_none(self) -> bool {
        self == VoiceId::NONE
    }

    /// Returns the raw value of the voice ID.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "voice#{}", self.0)
    }
}

/// Whether a voice plays once or loops until stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopMode {
    Once,
    Forever,
}

/// Voice priority tier. Lower priorities are evicted first when the voice
/// pool is full.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Low,
    High,
}

/// Devices report finished asset loads through this sender.
pub type ReadySender = UnboundedSender<AssetId>;

/// An audio output that can load sounds and mix voices of them.
///
/// Devices are dumb mixers: voice bookkeeping, priorities and readiness policy
/// live in the registry. Every method must return promptly.
pub trait Device: fmt::Display + Send + Sync {
    /// Starts loading the sound at the given path. The device sends `asset` on its
    /// ready sender once the sound can be played. Failed loads are never reported.
    fn load(&self, asset: AssetId, path: &Path);

    /// Starts a voice of a loaded sound. Returns `VoiceId::NONE` if the sound
    /// is unknown to the device.
    fn play(&self, asset: AssetId, left: f32, right: f32, loop_mode: LoopMode, rate: f32)
        -> VoiceId;

    /// Sets the volume of a playing voice.
    fn set_volume(&self, voice: VoiceId, left: f32, right: f32);

    /// Sets the playback rate of a playing voice.
    fn set_rate(&self, voice: VoiceId, rate: f32);

    /// Stops a voice.
    fn stop(&self, voice: VoiceId);

    /// Returns true if the voice is still sounding.
    fn is_playing(&self, voice: VoiceId) -> bool;
}

/// Lists output devices known to cpal.
pub fn list_devices() -> Result<Vec<String>, Box<dyn Error>> {
    cpal::Device::list()
}

/// Gets a device for the given configuration. Device names starting with "mock"
/// produce a mock device that loads everything instantly.
pub fn get_device(
    config: &config::Audio,
    ready_tx: ReadySender,
) -> Result<Arc<dyn Device>, Box<dyn Error>> {
    let device = config.device();
    if device.starts_with("mock") {
        return Ok(Arc::new(mock::Device::get(device, ready_tx)));
    };

    Ok(Arc::new(cpal::Device::get(config, ready_tx)?))
}
