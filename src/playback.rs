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
use std::fmt;

use tracing::{debug, info, warn};

use crate::audio::{AssetId, LoopMode, Priority, VoiceId};
use crate::config;
use crate::controller::Event;
use crate::mapping::{
    motion::{MotionMapper, MotionSample},
    proximity::{ProximityMapper, ProximitySample},
    Impact,
};
use crate::registry::VoiceRegistry;

/// Volume of one-shot sounds (ignite and impact).
const ONE_SHOT_VOLUME: f32 = 0.5;

/// Starting volume and rate of the low hum.
const DARK_HUM_VOLUME: f32 = 0.4;
const DARK_HUM_RATE: f32 = 1.0;

/// Starting volume and rate of the bright hum.
const LIGHT_HUM_VOLUME: f32 = 0.1;
const LIGHT_HUM_RATE: f32 = 1.2;

/// Where the engine is in bringing up its hum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No hum. Either nothing is loaded yet or the engine was paused.
    Idle,
    /// The ignite sound is loaded, the hum has not started yet.
    Starting,
    /// Both hum voices are sounding.
    Running,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineState::Idle => write!(f, "idle"),
            EngineState::Starting => write!(f, "starting"),
            EngineState::Running => write!(f, "running"),
        }
    }
}

/// The two looping hum voices. Both are `VoiceId::NONE` unless the engine is running.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HumVoices {
    pub dark: VoiceId,
    pub light: VoiceId,
}

impl HumVoices {
    /// Returns true if any hum voice exists.
    pub fn is_active(&self) -> bool {
        !self.dark.is_none() || !self.light.is_none()
    }
}

/// The assets requested for the configured sounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoundBank {
    pub ignite: AssetId,
    pub hum: AssetId,
    pub impact: AssetId,
}

/// Owns the hum lifecycle: decides when sounds are loaded, when the hum starts and
/// stops, and turns mapper output into voice commands.
pub struct PlaybackController {
    registry: VoiceRegistry,
    sounds: config::Sounds,
    /// Set once loads have been requested. Never cleared, so loads happen once.
    bank: Option<SoundBank>,
    state: EngineState,
    hums: HumVoices,
    /// True between Activate and Deactivate.
    active: bool,
    /// Set once ignite has played since the last Deactivate.
    ignited: bool,
    motion: MotionMapper,
    proximity: ProximityMapper,
}

impl PlaybackController {
    /// Creates a new, inactive playback controller.
    pub fn new(
        registry: VoiceRegistry,
        sounds: config::Sounds,
        mapping: &config::Mapping,
    ) -> PlaybackController {
        PlaybackController {
            registry,
            sounds,
            bank: None,
            state: EngineState::Idle,
            hums: HumVoices::default(),
            active: false,
            ignited: false,
            motion: MotionMapper::from_config(mapping),
            proximity: ProximityMapper::from_config(mapping),
        }
    }

    /// Handles a single event. Never blocks and never fails; anything that can't be
    /// acted on right now is dropped.
    pub fn handle(&mut self, event: Event) {
        match event {
            Event::Activate => self.activate(),
            Event::Deactivate => self.deactivate(),
            Event::AssetReady(asset) => self.asset_ready(asset),
            Event::Motion(sample) => self.motion(&sample),
            Event::Proximity(sample) => self.proximity(&sample),
        }
    }

    /// Returns the current engine state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Returns the hum voices.
    pub fn hums(&self) -> HumVoices {
        self.hums
    }

    /// Returns true if the controller is in the foreground.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the requested sound assets, if loading has started.
    pub fn bank(&self) -> Option<SoundBank> {
        self.bank
    }

    /// Returns the voice registry.
    pub fn registry(&self) -> &VoiceRegistry {
        &self.registry
    }

    fn activate(&mut self) {
        self.active = true;
        match self.bank {
            None => self.load_sounds(),
            Some(_) => self.try_start(),
        }
    }

    fn deactivate(&mut self) {
        self.active = false;
        self.ignited = false;
        self.registry.stop_all();
        self.hums = HumVoices::default();
        if self.state != EngineState::Idle {
            info!(from = %self.state, "Hum stopped.");
        }
        self.state = EngineState::Idle;
    }

    fn load_sounds(&mut self) {
        info!(
            ignite = ?self.sounds.ignite(),
            hum = ?self.sounds.hum(),
            impact = ?self.sounds.impact(),
            "Loading sounds."
        );
        let hum = self.registry.load_asset(self.sounds.hum());
        let impact = self.registry.load_asset(self.sounds.impact());
        let ignite = self.registry.load_asset(self.sounds.ignite());
        self.bank = Some(SoundBank {
            ignite,
            hum,
            impact,
        });
    }

    fn asset_ready(&mut self, asset: AssetId) {
        if !self.registry.mark_ready(asset) {
            return;
        }
        debug!(%asset, "Asset ready.");

        let Some(bank) = self.bank else {
            return;
        };
        if asset == bank.ignite && self.state == EngineState::Idle {
            info!("Ignite sound loaded.");
            self.state = EngineState::Starting;
        }
        self.try_start();
    }

    /// Starts the hum if the controller is active, not already running and the
    /// startup sounds are loaded.
    fn try_start(&mut self) {
        if !self.active || self.state == EngineState::Running {
            return;
        }
        let Some(bank) = self.bank else {
            return;
        };
        if !self.registry.is_ready(bank.ignite) || !self.registry.is_ready(bank.hum) {
            return;
        }

        self.state = EngineState::Starting;
        // A failed hum start is retried without igniting again.
        if !self.ignited {
            self.ignited = true;
            self.registry.play(
                bank.ignite,
                ONE_SHOT_VOLUME,
                ONE_SHOT_VOLUME,
                Priority::High,
                LoopMode::Once,
                1.0,
            );
        }

        let dark = self.registry.play(
            bank.hum,
            DARK_HUM_VOLUME,
            DARK_HUM_VOLUME,
            Priority::High,
            LoopMode::Forever,
            DARK_HUM_RATE,
        );
        let light = self.registry.play(
            bank.hum,
            LIGHT_HUM_VOLUME,
            LIGHT_HUM_VOLUME,
            Priority::High,
            LoopMode::Forever,
            LIGHT_HUM_RATE,
        );

        // Starting the light hum may have stolen the dark one in a tiny pool.
        let started =
            !dark.is_none() && !light.is_none() && self.registry.voice(dark).is_some();
        if !started {
            warn!(%dark, %light, "Unable to start hum voices.");
            self.registry.stop(dark);
            self.registry.stop(light);
            return;
        }

        self.hums = HumVoices { dark, light };
        self.state = EngineState::Running;
        info!(%dark, %light, "Hum running.");
    }

    fn motion(&mut self, sample: &MotionSample) {
        let output = self.motion.map(sample);

        if self.state == EngineState::Running {
            let parameters = output.parameters;
            self.registry.set_volume(
                self.hums.light,
                parameters.light_volume,
                parameters.light_volume,
            );
            self.registry.set_volume(
                self.hums.dark,
                parameters.dark_volume,
                parameters.dark_volume,
            );
            self.registry.set_rate(self.hums.dark, parameters.rate);
        } else {
            debug!(state = %self.state, "Dropping hum update.");
        }

        if let Some(impact) = output.impact {
            self.impact(impact);
        }
    }

    fn proximity(&mut self, sample: &ProximitySample) {
        if let Some(impact) = self.proximity.map(sample) {
            self.impact(impact);
        }
    }

    fn impact(&mut self, impact: Impact) {
        let Some(bank) = self.bank else {
            return;
        };
        if !self.hums.is_active() {
            debug!(?impact, "Dropping impact, no hum.");
            return;
        }

        debug!(?impact, "Impact.");
        self.registry.play(
            bank.impact,
            ONE_SHOT_VOLUME,
            ONE_SHOT_VOLUME,
            Priority::Low,
            LoopMode::Once,
            1.0,
        );
    }
}

impl fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackController")
            .field("state", &self.state)
            .field("active", &self.active)
            .field("hums", &self.hums)
            .field("registry", &self.registry)
            .finish()
    }
}
