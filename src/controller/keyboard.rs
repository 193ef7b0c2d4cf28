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
use std::io;

use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{info, span, warn, Level};

use super::Event;
use crate::mapping::{motion::MotionSample, proximity::ProximitySample};

const MOTION: &str = "motion";
const PROXIMITY: &str = "proximity";
const PAUSE: &str = "pause";
const RESUME: &str = "resume";

/// A driver that reads sensor samples typed on stdin.
pub struct Driver {}

impl Driver {
    pub fn new() -> Driver {
        Driver {}
    }

    /// Parses one line of input. Returns None for anything unrecognized.
    fn parse_command(input: &str) -> Option<Event> {
        let mut words = input.split_whitespace();
        let command = words.next()?.to_lowercase();
        let values = words
            .map(str::parse::<f32>)
            .collect::<Result<Vec<f32>, _>>()
            .ok()?;

        match (command.as_str(), values.as_slice()) {
            (MOTION, [x, y, z]) => Some(Event::Motion(MotionSample::new(*x, *y, *z))),
            (PROXIMITY, [distance]) => Some(Event::Proximity(ProximitySample::new(*distance))),
            (PAUSE, []) => Some(Event::Deactivate),
            (RESUME, []) => Some(Event::Activate),
            _ => None,
        }
    }

    /// Reads and forwards one command. Returns false once the input is exhausted.
    fn monitor_io<R, W>(events_tx: &Sender<Event>, mut reader: R, mut writer: W) -> io::Result<bool>
    where
        R: io::BufRead,
        W: io::Write,
    {
        write!(
            writer,
            "Command ({} <x> <y> <z>, {} <distance>, {}, {}): ",
            MOTION, PROXIMITY, PAUSE, RESUME,
        )?;
        writer.flush()?;
        let mut input: String = String::default();
        if reader.read_line(&mut input)? == 0 {
            return Ok(false);
        }

        match Self::parse_command(&input) {
            Some(event) => events_tx
                .blocking_send(event)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?,
            None => warn!(input = input.trim(), "Unrecognized input"),
        }
        Ok(true)
    }
}

impl Default for Driver {
    fn default() -> Self {
        Self::new()
    }
}

impl super::Driver for Driver {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
        tokio::task::spawn_blocking(move || {
            let span = span!(Level::INFO, "keyboard driver");
            let _enter = span.enter();

            info!("Keyboard driver started.");

            while Self::monitor_io(&events_tx, io::stdin().lock(), io::stdout())? {}

            info!("Keyboard input closed.");
            Ok(())
        })
    }
}

#[cfg(test)]
mod test {
    use std::io::{self, BufReader, BufWriter};

    use tokio::sync::mpsc;

    use crate::controller::Event;
    use crate::mapping::{motion::MotionSample, proximity::ProximitySample};

    use super::Driver;

    fn get_event(event: &str) -> Result<Option<Event>, io::Error> {
        let (sender, mut receiver) = mpsc::channel::<Event>(1);

        let reader = BufReader::new(event.as_bytes());
        let writer = BufWriter::new(Vec::new());
        assert!(Driver::monitor_io(&sender, reader, writer)?);

        // Force the sender to close.
        drop(sender);
        Ok(receiver.blocking_recv())
    }

    #[test]
    fn test_keyboard_events() -> Result<(), io::Error> {
        assert_eq!(
            Some(Event::Motion(MotionSample::new(1.0, -2.5, 13.0))),
            get_event("motion 1 -2.5 13\n")?
        );
        assert_eq!(
            Some(Event::Proximity(ProximitySample::new(0.5))),
            get_event("PROXIMITY 0.5")?
        );
        assert_eq!(Some(Event::Deactivate), get_event("pause")?);
        assert_eq!(Some(Event::Activate), get_event("  resume  \n")?);
        Ok(())
    }

    #[test]
    fn test_unrecognized_input() -> Result<(), io::Error> {
        assert_eq!(None, get_event("unrecognized")?);
        assert_eq!(None, get_event("motion 1 2")?);
        assert_eq!(None, get_event("proximity near")?);
        assert_eq!(None, get_event("pause now")?);
        assert_eq!(None, get_event("\n")?);
        Ok(())
    }

    #[test]
    fn test_end_of_input() -> Result<(), io::Error> {
        let (sender, _receiver) = mpsc::channel::<Event>(1);
        let reader = BufReader::new("".as_bytes());
        assert!(!Driver::monitor_io(&sender, reader, Vec::new())?);
        Ok(())
    }
}
