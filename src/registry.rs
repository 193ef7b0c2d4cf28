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
use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::{debug, warn};

use crate::audio::{AssetId, Device, LoopMode, Priority, VoiceId};

use self::voice::{Admission, VoicePool};

pub mod voice;

/// A sound the registry has asked the device to load.
#[derive(Debug, Clone)]
pub struct SoundAsset {
    id: AssetId,
    source: PathBuf,
    ready: bool,
}

impl SoundAsset {
    /// Returns the asset ID.
    pub fn id(&self) -> AssetId {
        self.id
    }

    /// Returns the file the asset was loaded from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Returns true once the device has reported the asset as loaded.
    pub fn is_ready(&self) -> bool {
        self.ready
    }
}

/// Tracks loaded sound assets and playing voices on top of a device. The pool is
/// bounded; when it is full, lower priority voices are stolen first.
pub struct VoiceRegistry {
    device: Arc<dyn Device>,
    assets: HashMap<AssetId, SoundAsset>,
    next_asset: u32,
    pool: VoicePool,
}

impl VoiceRegistry {
    /// Creates a new registry playing through the given device.
    pub fn new(device: Arc<dyn Device>, max_voices: usize) -> VoiceRegistry {
        VoiceRegistry {
            device,
            assets: HashMap::new(),
            next_asset: 1,
            pool: VoicePool::new(max_voices),
        }
    }

    /// Requests an asynchronous load of the given file. The returned asset is not
    /// ready until `mark_ready` is called for it.
    pub fn load_asset(&mut self, source: &Path) -> AssetId {
        let id = AssetId::new(self.next_asset);
        self.next_asset += 1;
        self.assets.insert(
            id,
            SoundAsset {
                id,
                source: source.to_path_buf(),
                ready: false,
            },
        );
        debug!(%id, source = ?source, "Requesting sound load.");
        self.device.load(id, source);
        id
    }

    /// Records that the device finished loading an asset. Returns false if the
    /// asset is unknown.
    pub fn mark_ready(&mut self, id: AssetId) -> bool {
        match self.assets.get_mut(&id) {
            Some(asset) => {
                asset.ready = true;
                true
            }
            None => {
                warn!(%id, "Ready notification for unknown asset.");
                false
            }
        }
    }

    /// Returns true if the asset is loaded.
    pub fn is_ready(&self, id: AssetId) -> bool {
        self.assets.get(&id).is_some_and(SoundAsset::is_ready)
    }

    /// Returns the asset with the given ID.
    pub fn asset(&self, id: AssetId) -> Option<&SoundAsset> {
        self.assets.get(&id)
    }

    /// Starts a voice. Returns `VoiceId::NONE` if the asset is not ready or there is
    /// no room for a voice of this priority.
    pub fn play(
        &mut self,
        asset: AssetId,
        left: f32,
        right: f32,
        priority: Priority,
        loop_mode: LoopMode,
        rate: f32,
    ) -> VoiceId {
        if !self.is_ready(asset) {
            debug!(%asset, "Dropping play request, asset not ready.");
            return VoiceId::NONE;
        }

        self.reap();

        match self.pool.admit(priority) {
            Admission::Free => {}
            Admission::Evict(victim) => {
                warn!(
                    %victim,
                    capacity = self.pool.capacity(),
                    "Voice limit reached, stealing voice."
                );
                self.pool.remove(victim);
                self.device.stop(victim);
            }
            Admission::Rejected => {
                debug!(
                    %asset,
                    ?priority,
                    capacity = self.pool.capacity(),
                    "Dropping play request, voice pool exhausted."
                );
                return VoiceId::NONE;
            }
        }

        let voice = self.device.play(asset, left, right, loop_mode, rate);
        if voice.is_none() {
            debug!(%asset, "Device refused to play asset.");
            return VoiceId::NONE;
        }

        self.pool
            .insert(voice, asset, priority, loop_mode, left, right, rate);
        debug!(%asset, %voice, ?priority, ?loop_mode, "Started voice.");
        voice
    }

    /// Sets the volume of a voice. Unknown voices are ignored.
    pub fn set_volume(&mut self, voice: VoiceId, left: f32, right: f32) {
        if let Some(entry) = self.pool.get_mut(voice) {
            entry.left = left;
            entry.right = right;
            self.device.set_volume(voice, left, right);
        }
    }

    /// Sets the rate of a voice. Unknown voices are ignored.
    pub fn set_rate(&mut self, voice: VoiceId, rate: f32) {
        if let Some(entry) = self.pool.get_mut(voice) {
            entry.rate = rate;
            self.device.set_rate(voice, rate);
        }
    }

    /// Stops a voice. Stopping an unknown or already stopped voice does nothing.
    pub fn stop(&mut self, voice: VoiceId) {
        if self.pool.remove(voice).is_some() {
            self.device.stop(voice);
        }
    }

    /// Stops every voice in the pool, one-shots included.
    pub fn stop_all(&mut self) {
        if self.pool.is_empty() {
            return;
        }
        let voices = self.pool.drain();
        debug!(count = voices.len(), "Stopping all voices.");
        for voice in voices {
            self.device.stop(voice.id);
        }
    }

    /// Returns the number of voices the registry believes are sounding.
    pub fn active_count(&self) -> usize {
        self.pool.len()
    }

    /// Returns the registry's view of a voice.
    pub fn voice(&self, voice: VoiceId) -> Option<&voice::Voice> {
        self.pool.get(voice)
    }

    /// Drops voices the device has finished playing.
    fn reap(&mut self) {
        let device = &self.device;
        self.pool.retain(|voice| device.is_playing(voice.id));
    }
}

impl fmt::Debug for VoiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoiceRegistry")
            .field("device", &self.device.to_string())
            .field("assets", &self.assets.len())
            .field("pool", &self.pool)
            .finish()
    }
}
