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
use std::error::Error;
use std::io;
use std::sync::Arc;

use tokio::sync::mpsc::{self, Sender, UnboundedReceiver};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info, info_span, Instrument};

use crate::audio::AssetId;
use crate::mapping::{motion::MotionSample, proximity::ProximitySample};
use crate::playback::PlaybackController;

pub mod keyboard;
pub mod trace;

/// Driver events are buffered up to this many before drivers block.
const EVENT_BUFFER: usize = 64;

/// Events that drive the playback controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    /// A gyroscope reading.
    Motion(MotionSample),

    /// A proximity sensor reading.
    Proximity(ProximitySample),

    /// The device finished loading an asset.
    AssetReady(AssetId),

    /// The engine moved to the foreground.
    Activate,

    /// The engine moved to the background. Stops the hum.
    Deactivate,
}

pub trait Driver: Send + Sync + 'static {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>>;
}

/// Serializes driver events and asset notifications into a playback controller.
pub struct Controller {
    handle: JoinHandle<PlaybackController>,
}

impl Controller {
    /// Creates a new controller with the given driver. The controller activates the
    /// playback controller immediately and deactivates it once the driver closes.
    pub fn new(
        playback: PlaybackController,
        driver: Arc<dyn Driver>,
        ready_rx: UnboundedReceiver<AssetId>,
    ) -> Result<Controller, Box<dyn Error>> {
        Ok(Controller {
            handle: tokio::spawn(
                Controller::dispatch_events(playback, driver, ready_rx)
                    .instrument(info_span!("controller")),
            ),
        })
    }

    /// Join will block until the controller finishes. Returns the playback controller
    /// in its final state.
    pub async fn join(&mut self) -> Result<PlaybackController, JoinError> {
        (&mut self.handle).await
    }

    /// Feeds events from the driver and the device into the playback controller until
    /// the driver closes.
    async fn dispatch_events(
        mut playback: PlaybackController,
        driver: Arc<dyn Driver>,
        mut ready_rx: UnboundedReceiver<AssetId>,
    ) -> PlaybackController {
        let (events_tx, mut events_rx) = mpsc::channel(EVENT_BUFFER);
        let join_handle = driver.monitor_events(events_tx);

        info!("Controller started.");
        playback.handle(Event::Activate);

        loop {
            tokio::select! {
                event = events_rx.recv() => match event {
                    Some(event) => {
                        debug!(?event, "Received event.");
                        playback.handle(event);
                    }
                    None => break,
                },
                Some(asset) = ready_rx.recv() => {
                    playback.handle(Event::AssetReady(asset));
                }
            }
        }

        info!("Controller closing.");
        playback.handle(Event::Deactivate);
        match join_handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(err = %e, "Driver failed."),
            Err(e) => error!("Error waiting for event monitor to stop: {}", e),
        }

        playback
    }
}

#[cfg(test)]
mod test {
    use std::{
        error::Error,
        io,
        sync::{Arc, Mutex},
    };

    use tokio::sync::mpsc::{self, Sender};
    use tokio::task::JoinHandle;

    use crate::{
        audio::{mock, LoopMode},
        config::{Mapping, Sounds},
        mapping::{motion::MotionSample, proximity::ProximitySample},
        playback::{EngineState, PlaybackController},
        registry::VoiceRegistry,
        testutil::eventually,
    };

    use super::{Controller, Driver, Event};

    fn hum_plays(device: &mock::Device) -> usize {
        device
            .commands()
            .iter()
            .filter(|command| {
                matches!(
                    command,
                    mock::Command::Play {
                        loop_mode: LoopMode::Forever,
                        ..
                    }
                )
            })
            .count()
    }

    /// A driver that hands its sender to the test.
    struct TestDriver {
        events_tx: Arc<Mutex<Option<Sender<Event>>>>,
        close_rx: Mutex<Option<tokio::sync::oneshot::Receiver<()>>>,
    }

    impl Driver for TestDriver {
        fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
            *self.events_tx.lock().expect("failed to get lock") = Some(events_tx);
            let close_rx = self
                .close_rx
                .lock()
                .expect("failed to get lock")
                .take()
                .expect("monitor_events called twice");
            tokio::spawn(async move {
                let _ = close_rx.await;
                Ok(())
            })
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_controller() -> Result<(), Box<dyn Error>> {
        let (ready_tx, ready_rx) = mpsc::unbounded_channel();
        let device = mock::Device::get("mock-device", ready_tx);
        let registry = VoiceRegistry::new(Arc::new(device.clone()), 4);
        let playback = PlaybackController::new(
            registry,
            Sounds::new("ignite.wav", "hum.wav", "impact.wav"),
            &Mapping::default(),
        );

        let events_tx = Arc::new(Mutex::new(None));
        let (close_tx, close_rx) = tokio::sync::oneshot::channel();
        let driver = Arc::new(TestDriver {
            events_tx: events_tx.clone(),
            close_rx: Mutex::new(Some(close_rx)),
        });
        let mut controller = Controller::new(playback, driver, ready_rx)?;

        // Activation loads everything, the mock finishes instantly and the hum starts.
        eventually(
            || device.playing_count() == 3,
            "Hum never started playing",
        );
        assert_eq!(device.loads().len(), 3);

        let sender = events_tx
            .lock()
            .expect("failed to get lock")
            .clone()
            .expect("driver never started");

        sender
            .send(Event::Motion(MotionSample::new(0.0, 0.0, 13.0)))
            .await?;
        eventually(
            || device.playing_count() == 4,
            "Swing impact never played",
        );

        sender
            .send(Event::Proximity(ProximitySample::new(2.0)))
            .await?;
        sender.send(Event::Deactivate).await?;
        eventually(
            || device.playing_count() == 0,
            "Playback never stopped",
        );

        sender.send(Event::Activate).await?;
        eventually(
            || hum_plays(&device) == 4 && device.playing_count() == 3,
            "Hum never restarted",
        );
        assert_eq!(device.loads().len(), 3);

        // Closing the driver deactivates and ends the controller.
        drop(sender);
        events_tx.lock().expect("failed to get lock").take();
        close_tx.send(()).expect("driver already closed");

        let playback = controller.join().await?;
        assert_eq!(playback.state(), EngineState::Idle);
        assert!(!playback.is_active());
        assert!(!playback.hums().is_active());

        assert_eq!(device.playing_count(), 0);

        Ok(())
    }
}
