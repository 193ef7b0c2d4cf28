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
    error::Error,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::Deserialize;

use crate::controller::{self, keyboard, trace};

/// Allows users to specify where sensor samples come from.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Driver {
    /// Samples typed on stdin.
    #[default]
    Keyboard,
    /// Samples replayed from a recorded trace file.
    Trace { path: PathBuf },
}

impl Driver {
    /// Creates the driver, resolving relative trace paths against the base path.
    pub fn driver(&self, base_path: &Path) -> Result<Arc<dyn controller::Driver>, Box<dyn Error>> {
        Ok(match self {
            Driver::Keyboard => Arc::new(keyboard::Driver::new()),
            Driver::Trace { path } => {
                let path = if path.is_absolute() {
                    path.clone()
                } else {
                    base_path.join(path)
                };
                Arc::new(trace::Driver::from_file(&path)?)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use config::{Config, File, FileFormat};

    use super::*;

    #[test]
    fn test_driver_deserialize() {
        let keyboard: Driver = Config::builder()
            .add_source(File::from_str("kind: keyboard", FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(keyboard, Driver::Keyboard);

        let yaml = r#"
            kind: trace
            path: traces/swing.yaml
        "#;
        let trace: Driver = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(
            trace,
            Driver::Trace {
                path: PathBuf::from("traces/swing.yaml")
            }
        );
    }
}
