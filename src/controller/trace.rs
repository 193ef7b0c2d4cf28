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
use std::{io, path::Path, thread, time::Duration};

use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{info, span, Level};

use super::Event;
use crate::config::{self, ConfigError};

/// A driver that replays a recorded sensor trace, honoring the delays between steps.
pub struct Driver {
    steps: Vec<(Duration, Event)>,
}

impl Driver {
    /// Creates a driver from already validated steps.
    pub fn new(steps: Vec<(Duration, Event)>) -> Driver {
        Driver { steps }
    }

    /// Loads and validates a trace file.
    pub fn from_file(path: &Path) -> Result<Driver, ConfigError> {
        Ok(Driver::new(config::parse_trace(path)?.events()?))
    }

    /// Returns the number of steps in the trace.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the trace has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl super::Driver for Driver {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
        let steps = self.steps.clone();
        tokio::task::spawn_blocking(move || {
            let span = span!(Level::INFO, "trace driver");
            let _enter = span.enter();

            info!(steps = steps.len(), "Trace driver started.");

            for (delay, event) in steps {
                if !delay.is_zero() {
                    thread::sleep(delay);
                }
                events_tx
                    .blocking_send(event)
                    .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            }

            info!("Trace finished.");
            Ok(())
        })
    }
}

#[cfg(test)]
mod test {
    use std::{error::Error, fs, time::Instant};

    use tokio::sync::mpsc;

    use crate::controller::Driver as _;
    use crate::mapping::{motion::MotionSample, proximity::ProximitySample};

    use super::*;

    #[test]
    fn test_from_file() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("swing.yaml");
        fs::write(
            &path,
            "steps:\n  - motion: [0.0, 0.0, 13.0]\n  - lifecycle: pause\n",
        )?;

        let driver = Driver::from_file(&path)?;
        assert_eq!(driver.len(), 2);
        Ok(())
    }

    #[test]
    fn test_from_invalid_file() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("broken.yaml");
        fs::write(&path, "steps:\n  - delay: 5ms\n")?;

        assert!(matches!(
            Driver::from_file(&path),
            Err(ConfigError::InvalidTraceStep { index: 0, .. })
        ));
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_replay() -> Result<(), Box<dyn Error>> {
        let driver = Driver::new(vec![
            (Duration::ZERO, Event::Motion(MotionSample::new(0.0, 0.0, 1.0))),
            (
                Duration::from_millis(50),
                Event::Proximity(ProximitySample::new(0.5)),
            ),
            (Duration::from_millis(10), Event::Deactivate),
        ]);

        let (events_tx, mut events_rx) = mpsc::channel(8);
        let start = Instant::now();
        let handle = driver.monitor_events(events_tx);

        let mut received = Vec::new();
        while let Some(event) = events_rx.recv().await {
            received.push(event);
        }
        handle.await??;

        assert!(start.elapsed() >= Duration::from_millis(60));
        assert_eq!(
            received,
            vec![
                Event::Motion(MotionSample::new(0.0, 0.0, 1.0)),
                Event::Proximity(ProximitySample::new(0.5)),
                Event::Deactivate,
            ]
        );
        Ok(())
    }
}
