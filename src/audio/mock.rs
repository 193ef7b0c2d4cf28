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
    collections::{HashMap, HashSet},
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::Mutex;
use tracing::{debug, info};

use super::{AssetId, LoopMode, ReadySender, VoiceId};

/// A command received by the mock device.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Load {
        asset: AssetId,
        path: PathBuf,
    },
    Play {
        voice: VoiceId,
        asset: AssetId,
        left: f32,
        right: f32,
        loop_mode: LoopMode,
        rate: f32,
    },
    SetVolume {
        voice: VoiceId,
        left: f32,
        right: f32,
    },
    SetRate {
        voice: VoiceId,
        rate: f32,
    },
    Stop {
        voice: VoiceId,
    },
}

/// The state of a voice on the mock device.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MockVoice {
    pub asset: AssetId,
    pub left: f32,
    pub right: f32,
    pub loop_mode: LoopMode,
    pub rate: f32,
}

#[derive(Default)]
struct State {
    next_voice: u64,
    loaded: HashSet<AssetId>,
    voices: HashMap<VoiceId, MockVoice>,
    commands: Vec<Command>,
}

/// A mock device. Doesn't actually play anything, but remembers what it was told.
#[derive(Clone)]
pub struct Device {
    name: String,
    ready_tx: ReadySender,
    /// Whether loads complete as soon as they are requested.
    instant_load: bool,
    state: Arc<Mutex<State>>,
}

impl Device {
    /// Gets a mock device that finishes every load immediately.
    pub fn get(name: &str, ready_tx: ReadySender) -> Device {
        Device {
            name: name.to_string(),
            ready_tx,
            instant_load: true,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Gets a mock device whose loads only finish through `complete_load`.
    pub fn deferred(name: &str, ready_tx: ReadySender) -> Device {
        Device {
            instant_load: false,
            ..Device::get(name, ready_tx)
        }
    }

    /// Finishes loading the given asset and reports it as ready.
    pub fn complete_load(&self, asset: AssetId) {
        self.state.lock().loaded.insert(asset);
        if self.ready_tx.send(asset).is_err() {
            debug!(%asset, "Nobody is listening for ready assets");
        }
    }

    /// Ends a voice as though it had played to completion.
    pub fn finish(&self, voice: VoiceId) {
        self.state.lock().voices.remove(&voice);
    }

    /// Returns every command received so far.
    pub fn commands(&self) -> Vec<Command> {
        self.state.lock().commands.clone()
    }

    /// Returns the paths of every load request received so far.
    pub fn loads(&self) -> Vec<PathBuf> {
        self.state
            .lock()
            .commands
            .iter()
            .filter_map(|command| match command {
                Command::Load { path, .. } => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    /// Returns the state of a sounding voice.
    pub fn voice(&self, voice: VoiceId) -> Option<MockVoice> {
        self.state.lock().voices.get(&voice).copied()
    }

    /// Returns the number of voices currently sounding.
    pub fn playing_count(&self) -> usize {
        self.state.lock().voices.len()
    }
}

impl super::Device for Device {
    fn load(&self, asset: AssetId, path: &Path) {
        info!(device = self.name, %asset, path = ?path, "Loading sound (mock).");
        self.state.lock().commands.push(Command::Load {
            asset,
            path: path.to_path_buf(),
        });
        if self.instant_load {
            self.complete_load(asset);
        }
    }

    fn play(
        &self,
        asset: AssetId,
        left: f32,
        right: f32,
        loop_mode: LoopMode,
        rate: f32,
    ) -> VoiceId {
        let mut state = self.state.lock();
        if !state.loaded.contains(&asset) {
            return VoiceId::NONE;
        }

        state.next_voice += 1;
        let voice = VoiceId::new(state.next_voice);
        state.voices.insert(
            voice,
            MockVoice {
                asset,
                left,
                right,
                loop_mode,
                rate,
            },
        );
        state.commands.push(Command::Play {
            voice,
            asset,
            left,
            right,
            loop_mode,
            rate,
        });
        voice
    }

    fn set_volume(&self, voice: VoiceId, left: f32, right: f32) {
        let mut state = self.state.lock();
        if let Some(playing) = state.voices.get_mut(&voice) {
            playing.left = left;
            playing.right = right;
        }
        state
            .commands
            .push(Command::SetVolume { voice, left, right });
    }

    fn set_rate(&self, voice: VoiceId, rate: f32) {
        let mut state = self.state.lock();
        if let Some(playing) = state.voices.get_mut(&voice) {
            playing.rate = rate;
        }
        state.commands.push(Command::SetRate { voice, rate });
    }

    fn stop(&self, voice: VoiceId) {
        let mut state = self.state.lock();
        state.voices.remove(&voice);
        state.commands.push(Command::Stop { voice });
    }

    fn is_playing(&self, voice: VoiceId) -> bool {
        self.state.lock().voices.contains_key(&voice)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}
