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
use std::time::Duration;

use duration_string::DurationString;
use serde::Deserialize;

use super::error::ConfigError;
use crate::controller::Event;
use crate::mapping::{motion::MotionSample, proximity::ProximitySample};

/// A lifecycle edge recorded in a trace.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    Pause,
    Resume,
}

/// A YAML representation of a recorded sensor trace.
#[derive(Deserialize, Clone, Debug)]
pub struct Trace {
    /// The recorded steps, in playback order.
    steps: Vec<TraceStep>,
}

/// A single step in a trace. Exactly one of motion, proximity or lifecycle must be set.
#[derive(Deserialize, Clone, Debug)]
pub struct TraceStep {
    /// How long to wait before delivering this step, e.g. "60ms".
    delay: Option<String>,
    /// Angular velocity as [x, y, z].
    motion: Option<[f32; 3]>,
    /// Proximity distance.
    proximity: Option<f32>,
    /// Foreground/background edge.
    lifecycle: Option<Lifecycle>,
}

impl Trace {
    /// Returns the raw steps.
    pub fn steps(&self) -> &[TraceStep] {
        &self.steps
    }

    /// Validates the trace and converts it into delays and events.
    pub fn events(&self) -> Result<Vec<(Duration, Event)>, ConfigError> {
        self.steps
            .iter()
            .enumerate()
            .map(|(index, step)| Ok((step.delay()?, step.event(index)?)))
            .collect()
    }
}

impl TraceStep {
    /// Returns the delay before this step.
    pub fn delay(&self) -> Result<Duration, ConfigError> {
        match &self.delay {
            Some(delay) => Ok(DurationString::from_string(delay.clone())
                .map_err(|e| ConfigError::InvalidDuration(delay.clone(), e.to_string()))?
                .into()),
            None => Ok(Duration::ZERO),
        }
    }

    /// Converts the step into the event it describes.
    fn event(&self, index: usize) -> Result<Event, ConfigError> {
        match (self.motion, self.proximity, self.lifecycle) {
            (Some([x, y, z]), None, None) => Ok(Event::Motion(MotionSample::new(x, y, z))),
            (None, Some(distance), None) => Ok(Event::Proximity(ProximitySample::new(distance))),
            (None, None, Some(Lifecycle::Pause)) => Ok(Event::Deactivate),
            (None, None, Some(Lifecycle::Resume)) => Ok(Event::Activate),
            (None, None, None) => Err(ConfigError::InvalidTraceStep {
                index,
                reason: "step has no motion, proximity or lifecycle".to_string(),
            }),
            _ => Err(ConfigError::InvalidTraceStep {
                index,
                reason: "step has more than one of motion, proximity or lifecycle".to_string(),
            }),
        }
    }
}
