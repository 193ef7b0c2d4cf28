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
use crate::config::{self, TriggerMode};

use super::{Impact, ImpactLatch};

/// Distance below which the proximity sensor reports an impact.
pub const PROXIMITY_THRESHOLD: f32 = 1.0;

/// A reading from the proximity sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximitySample {
    pub distance: f32,
}

impl ProximitySample {
    pub fn new(distance: f32) -> ProximitySample {
        ProximitySample { distance }
    }
}

/// Maps proximity samples to impacts.
#[derive(Debug, Clone)]
pub struct ProximityMapper {
    threshold: f32,
    mode: TriggerMode,
    latch: ImpactLatch,
}

impl ProximityMapper {
    pub fn new(threshold: f32, mode: TriggerMode) -> ProximityMapper {
        ProximityMapper {
            threshold,
            mode,
            latch: ImpactLatch::default(),
        }
    }

    /// Creates a mapper from the configured tunables.
    pub fn from_config(mapping: &config::Mapping) -> ProximityMapper {
        ProximityMapper::new(mapping.proximity_threshold(), mapping.proximity_trigger())
    }

    /// Maps a sample to an optional impact.
    pub fn map(&mut self, sample: &ProximitySample) -> Option<Impact> {
        let near = sample.distance < self.threshold;
        let fire = match self.mode {
            TriggerMode::Level => near,
            TriggerMode::Edge => self.latch.update(near),
        };
        fire.then_some(Impact::Proximity)
    }
}

impl Default for ProximityMapper {
    fn default() -> Self {
        ProximityMapper::new(PROXIMITY_THRESHOLD, TriggerMode::default())
    }
}
