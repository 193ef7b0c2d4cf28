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

//! Sensor-to-audio mapping. Mappers are pure state machines: they take samples and
//! return parameter updates and impacts, and never touch audio themselves.

pub mod motion;
pub mod proximity;

/// Where an impact came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Impact {
    /// A sharp swing.
    Swing,
    /// Something close to the proximity sensor.
    Proximity,
}

/// Turns a level condition into a single trigger per excursion.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImpactLatch {
    set: bool,
}

impl ImpactLatch {
    /// Advances the latch with the current condition. Returns true only on the
    /// first sample of each run where the condition holds.
    pub fn update(&mut self, above: bool) -> bool {
        let fire = above && !self.set;
        self.set = above;
        fire
    }

    /// Returns true while inside an excursion.
    pub fn is_set(&self) -> bool {
        self.set
    }
}
