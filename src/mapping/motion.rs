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
use crate::config;

use super::{Impact, ImpactLatch};

/// Squared z angular velocity above which a swing is an impact.
pub const IMPACT_THRESHOLD: f32 = 150.0;

/// Divisor that turns squared angular velocity into a strength of roughly 0..1.
pub const NORMALIZER: f32 = 145.0;

const LIGHT_FLOOR: f32 = 0.1;
const LIGHT_CEILING: f32 = 1.0;
const DARK_FLOOR: f32 = 0.1;
const DARK_CEILING: f32 = 0.4;
const RATE_FLOOR: f32 = 1.0;
const RATE_CEILING: f32 = 1.2;

/// Angular velocity from the gyroscope, in rad/s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl MotionSample {
    pub fn new(x: f32, y: f32, z: f32) -> MotionSample {
        MotionSample { x, y, z }
    }
}

/// Hum voice parameters derived from one motion sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HumParameters {
    /// Volume of the bright hum.
    pub light_volume: f32,
    /// Volume of the low hum.
    pub dark_volume: f32,
    /// Playback rate of the low hum.
    pub rate: f32,
}

impl HumParameters {
    /// Computes the parameters for a normalized strength. Any finite strength,
    /// including negative ones, yields values inside the clamp ranges.
    pub fn from_strength(strength: f32) -> HumParameters {
        HumParameters {
            light_volume: (strength + LIGHT_FLOOR).clamp(LIGHT_FLOOR, LIGHT_CEILING),
            dark_volume: (DARK_CEILING - strength).clamp(DARK_FLOOR, DARK_CEILING),
            rate: (strength / 2.0 + RATE_FLOOR).clamp(RATE_FLOOR, RATE_CEILING),
        }
    }
}

/// The result of mapping one motion sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionOutput {
    pub parameters: HumParameters,
    pub impact: Option<Impact>,
}

/// Maps motion samples to hum parameters and swing impacts.
#[derive(Debug, Clone)]
pub struct MotionMapper {
    impact_threshold: f32,
    normalizer: f32,
    latch: ImpactLatch,
}

impl MotionMapper {
    pub fn new(impact_threshold: f32, normalizer: f32) -> MotionMapper {
        MotionMapper {
            impact_threshold,
            normalizer,
            latch: ImpactLatch::default(),
        }
    }

    /// Creates a mapper from the configured tunables.
    pub fn from_config(mapping: &config::Mapping) -> MotionMapper {
        MotionMapper::new(mapping.impact_threshold(), mapping.normalizer())
    }

    /// Maps a sample. The latch advances on every call, whether or not the
    /// caller ends up using the output.
    pub fn map(&mut self, sample: &MotionSample) -> MotionOutput {
        let z_strength = sample.z * sample.z;
        let impact = self
            .latch
            .update(z_strength > self.impact_threshold)
            .then_some(Impact::Swing);

        let strength = (z_strength + sample.x * sample.x) / self.normalizer;
        // A garbage sample must not reach the device as NaN.
        let strength = if strength.is_finite() { strength } else { 0.0 };
        MotionOutput {
            parameters: HumParameters::from_strength(strength),
            impact,
        }
    }
}

impl Default for MotionMapper {
    fn default() -> Self {
        MotionMapper::new(IMPACT_THRESHOLD, NORMALIZER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_still_sample() {
        let mut mapper = MotionMapper::default();
        let output = mapper.map(&MotionSample::new(0.0, 0.0, 0.0));

        assert_close(output.parameters.light_volume, 0.1);
        assert_close(output.parameters.dark_volume, 0.4);
        assert_close(output.parameters.rate, 1.0);
        assert_eq!(output.impact, None);
    }

    #[test]
    fn test_swing_then_rest() {
        let mut mapper = MotionMapper::default();

        // 13² = 169 > 150.
        let output = mapper.map(&MotionSample::new(0.0, 0.0, 13.0));
        assert_eq!(output.impact, Some(Impact::Swing));
        assert_close(output.parameters.light_volume, 1.0);
        assert_close(output.parameters.dark_volume, 0.1);
        assert_close(output.parameters.rate, 1.2);

        let output = mapper.map(&MotionSample::new(0.0, 0.0, 0.0));
        assert_eq!(output.impact, None);
    }

    #[test]
    fn test_one_impact_per_excursion() {
        let mut mapper = MotionMapper::default();
        let zs = [0.0, 13.0, 14.0, -15.0, 12.0, 13.0, -13.0, 0.0, 20.0];

        let impacts: Vec<bool> = zs
            .iter()
            .map(|z| mapper.map(&MotionSample::new(0.0, 0.0, *z)).impact.is_some())
            .collect();

        // 12² = 144 re-arms the latch.
        assert_eq!(
            impacts,
            vec![false, true, false, false, false, true, false, false, true]
        );
    }

    #[test]
    fn test_non_finite_sample_rests() {
        let mut mapper = MotionMapper::default();
        for sample in [
            MotionSample::new(f32::NAN, 0.0, 0.0),
            MotionSample::new(0.0, 0.0, f32::NAN),
            MotionSample::new(f32::INFINITY, 0.0, 0.0),
        ] {
            let parameters = mapper.map(&sample).parameters;
            assert_eq!(parameters, HumParameters::from_strength(0.0));
        }

        // A zero normalizer divides into NaN and infinity.
        let mut mapper = MotionMapper::new(IMPACT_THRESHOLD, 0.0);
        for x in [0.0, 3.0] {
            let parameters = mapper.map(&MotionSample::new(x, 0.0, 0.0)).parameters;
            assert_eq!(parameters, HumParameters::from_strength(0.0));
        }
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let mut mapper = MotionMapper::new(4.0, NORMALIZER);
        assert_eq!(mapper.map(&MotionSample::new(0.0, 0.0, 2.0)).impact, None);
        assert_eq!(
            mapper.map(&MotionSample::new(0.0, 0.0, 2.5)).impact,
            Some(Impact::Swing)
        );
        assert_eq!(mapper.map(&MotionSample::new(0.0, 0.0, 2.0)).impact, None);
        assert_eq!(
            mapper.map(&MotionSample::new(0.0, 0.0, 2.5)).impact,
            Some(Impact::Swing)
        );
    }

    #[test]
    fn test_x_and_z_drive_strength() {
        let mut mapper = MotionMapper::default();

        // (3² + 4²) / 145 = 25/145.
        let strength = 25.0 / 145.0;
        let output = mapper.map(&MotionSample::new(3.0, 100.0, 4.0));
        assert_close(output.parameters.light_volume, strength + 0.1);
        assert_close(output.parameters.dark_volume, 0.4 - strength);
        assert_close(output.parameters.rate, strength / 2.0 + 1.0);
        assert_eq!(output.impact, None);
    }

    #[test]
    fn test_y_is_ignored() {
        let mut mapper = MotionMapper::default();
        let a = mapper.map(&MotionSample::new(1.0, 0.0, 2.0));
        let b = mapper.map(&MotionSample::new(1.0, 500.0, 2.0));
        assert_eq!(a, b);
    }

    #[test]
    fn test_parameters_stay_in_range() {
        for strength in [
            -1.0e9, -100.0, -1.0, -0.2, 0.0, 0.05, 0.3, 0.5, 0.9, 1.0, 2.0, 1.0e9,
        ] {
            let parameters = HumParameters::from_strength(strength);
            assert!((0.1..=1.0).contains(&parameters.light_volume));
            assert!((0.1..=0.4).contains(&parameters.dark_volume));
            assert!((1.0..=1.2).contains(&parameters.rate));
        }
    }

    #[test]
    fn test_light_and_dark_move_apart() {
        let mut previous = HumParameters::from_strength(0.0);
        for step in 1..=10 {
            let parameters = HumParameters::from_strength(step as f32 * 0.02);
            assert!(parameters.light_volume > previous.light_volume);
            assert!(parameters.dark_volume < previous.dark_volume);
            assert!(parameters.rate >= previous.rate);
            previous = parameters;
        }
    }
}
