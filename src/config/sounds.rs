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

/// The sound files used by the engine.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Sounds {
    /// Played once when the blade ignites.
    ignite: PathBuf,
    /// Looped twice (dark and light) while the blade is lit.
    hum: PathBuf,
    /// Played on every impact.
    impact: PathBuf,
}

impl Sounds {
    /// Creates a new sound set.
    pub fn new<P: Into<PathBuf>>(ignite: P, hum: P, impact: P) -> Sounds {
        Sounds {
            ignite: ignite.into(),
            hum: hum.into(),
            impact: impact.into(),
        }
    }

    /// Returns the ignite sound path.
    pub fn ignite(&self) -> &Path {
        &self.ignite
    }

    /// Returns the hum sound path.
    pub fn hum(&self) -> &Path {
        &self.hum
    }

    /// Returns the impact sound path.
    pub fn impact(&self) -> &Path {
        &self.impact
    }

    /// Returns every sound with a short label, in load order.
    pub fn all(&self) -> [(&'static str, &Path); 3] {
        [
            ("hum", self.hum.as_path()),
            ("impact", self.impact.as_path()),
            ("ignite", self.ignite.as_path()),
        ]
    }

    /// Resolves relative paths against the given base directory.
    pub fn resolve(&self, base_path: &Path) -> Sounds {
        let resolve = |file: &Path| {
            if file.is_absolute() {
                file.to_path_buf()
            } else {
                base_path.join(file)
            }
        };
        Sounds {
            ignite: resolve(&self.ignite),
            hum: resolve(&self.hum),
            impact: resolve(&self.impact),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_and_absolute() {
        let sounds = Sounds::new("sounds/ignite.wav", "/opt/hum.wav", "impact.wav");
        let resolved = sounds.resolve(Path::new("/etc/saberhum"));

        assert_eq!(
            resolved.ignite(),
            Path::new("/etc/saberhum/sounds/ignite.wav")
        );
        assert_eq!(resolved.hum(), Path::new("/opt/hum.wav"));
        assert_eq!(resolved.impact(), Path::new("/etc/saberhum/impact.wav"));
    }

    #[test]
    fn test_load_order_puts_ignite_last() {
        let sounds = Sounds::new("ignite.wav", "hum.wav", "impact.wav");
        let labels: Vec<&str> = sounds.all().iter().map(|(label, _)| *label).collect();
        assert_eq!(labels, vec!["hum", "impact", "ignite"]);
    }
}
