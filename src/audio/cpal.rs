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
    collections::HashMap,
    error::Error,
    fmt,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    thread,
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, span, warn, Level};

use super::decode::decode_file;
use super::error::AudioError;
use super::mixer::{Mixer, Sound};
use super::{AssetId, LoopMode, ReadySender, VoiceId};
use crate::config;

/// A request for the loader thread.
struct LoadJob {
    asset: AssetId,
    path: PathBuf,
}

/// An output device backed by cpal. Sounds are decoded on a loader thread and
/// voices are mixed directly in the stream callback.
pub struct Device {
    /// The name of the device.
    name: String,
    /// The host ID of the device.
    host_id: cpal::HostId,
    /// The output sample rate.
    sample_rate: u32,
    /// The number of output channels.
    num_channels: u16,
    /// The mixer shared with the stream callback.
    mixer: Arc<Mutex<Mixer>>,
    /// Decoded sounds by asset.
    sounds: Arc<RwLock<HashMap<AssetId, Sound>>>,
    /// Queue of sounds waiting to be decoded.
    load_tx: crossbeam_channel::Sender<LoadJob>,
    /// The next voice ID to hand out.
    next_voice: AtomicU64,
    /// Dropping or signalling this stops the output thread.
    shutdown_tx: crossbeam_channel::Sender<()>,
    /// Handle to the thread that owns the cpal stream.
    output_thread: Option<thread::JoinHandle<()>>,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}, Rate={}) ({})",
            self.name,
            self.num_channels,
            self.sample_rate,
            self.host_id.name()
        )
    }
}

/// Builds an output stream that renders the mixer into samples of type T.
fn build_stream<T>(
    device: &cpal::Device,
    stream_config: &cpal::StreamConfig,
    mixer: Arc<Mutex<Mixer>>,
) -> Result<cpal::Stream, AudioError>
where
    T: cpal::SizedSample + cpal::FromSample<f32> + 'static,
{
    let mut scratch: Vec<f32> = Vec::new();
    device
        .build_output_stream(
            stream_config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                scratch.resize(data.len(), 0.0);
                mixer.lock().process_into_output(&mut scratch);
                for (dst, &src) in data.iter_mut().zip(scratch.iter()) {
                    *dst = T::from_sample(src);
                }
            },
            |err| error!(err = err.to_string(), "cpal output stream error"),
            None,
        )
        .map_err(|e| AudioError::Device(e.to_string()))
}

impl Device {
    /// Lists the output devices of every available host.
    pub fn list() -> Result<Vec<String>, Box<dyn Error>> {
        let mut devices = Vec::new();
        for host_id in cpal::available_hosts() {
            let host_devices = match cpal::host_from_id(host_id)?.output_devices() {
                Ok(host_devices) => host_devices,
                Err(e) => {
                    error!(
                        err = e.to_string(),
                        host = host_id.name(),
                        "Unable to list devices for host"
                    );
                    continue;
                }
            };

            for device in host_devices {
                let Ok(output_config) = device.default_output_config() else {
                    continue;
                };
                devices.push(format!(
                    "{} (Channels={}, Rate={}) ({})",
                    device.name()?,
                    output_config.channels(),
                    output_config.sample_rate().0,
                    host_id.name()
                ));
            }
        }

        devices.sort();
        Ok(devices)
    }

    /// Gets the cpal output device with the configured name and starts its stream.
    pub fn get(config: &config::Audio, ready_tx: ReadySender) -> Result<Device, Box<dyn Error>> {
        let name = config.device();
        for host_id in cpal::available_hosts() {
            let host = cpal::host_from_id(host_id)?;
            let host_devices = match host.output_devices() {
                Ok(host_devices) => host_devices,
                Err(e) => {
                    error!(
                        err = e.to_string(),
                        host = host_id.name(),
                        "Unable to list devices for host"
                    );
                    continue;
                }
            };

            for device in host_devices {
                if device.name().is_ok_and(|n| n.trim() == name) {
                    return Ok(Device::start(host_id, device, config, ready_tx)?);
                }
            }
        }

        Err(AudioError::DeviceNotFound(name.to_string()).into())
    }

    /// Starts the loader and output threads for the given cpal device.
    fn start(
        host_id: cpal::HostId,
        device: cpal::Device,
        config: &config::Audio,
        ready_tx: ReadySender,
    ) -> Result<Device, AudioError> {
        let name = device
            .name()
            .map_err(|e| AudioError::Device(e.to_string()))?;
        let default_config = device
            .default_output_config()
            .map_err(|e| AudioError::Device(e.to_string()))?;
        let num_channels = default_config.channels();
        let sample_format = default_config.sample_format();
        let sample_rate = config
            .sample_rate()
            .unwrap_or(default_config.sample_rate().0);

        let mixer = Arc::new(Mutex::new(Mixer::new(num_channels)));
        let sounds: Arc<RwLock<HashMap<AssetId, Sound>>> = Arc::new(RwLock::new(HashMap::new()));

        let (load_tx, load_rx) = crossbeam_channel::unbounded::<LoadJob>();
        {
            let sounds = sounds.clone();
            thread::spawn(move || {
                let span = span!(Level::INFO, "sound loader (cpal)");
                let _enter = span.enter();

                for job in load_rx.iter() {
                    let loaded = decode_file(&job.path)
                        .and_then(|decoded| decoded.into_sound(sample_rate));
                    match loaded {
                        Ok(sound) => {
                            sounds.write().insert(job.asset, sound);
                            if ready_tx.send(job.asset).is_err() {
                                debug!(asset = %job.asset, "Nobody is listening for ready assets");
                            }
                        }
                        Err(e) => {
                            warn!(path = ?job.path, err = %e, "Failed to load sound");
                        }
                    }
                }
            });
        }

        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);
        let (started_tx, started_rx) = crossbeam_channel::bounded::<Result<(), AudioError>>(1);
        let output_thread = {
            let mixer = mixer.clone();
            // The stream is created and dropped on this thread, as it isn't Send everywhere.
            thread::spawn(move || {
                let stream_config = cpal::StreamConfig {
                    channels: num_channels,
                    sample_rate: cpal::SampleRate(sample_rate),
                    buffer_size: cpal::BufferSize::Default,
                };

                let stream = match sample_format {
                    cpal::SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, mixer),
                    cpal::SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, mixer),
                    cpal::SampleFormat::I32 => build_stream::<i32>(&device, &stream_config, mixer),
                    cpal::SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, mixer),
                    other => Err(AudioError::Device(format!(
                        "unsupported sample format {:?}",
                        other
                    ))),
                };

                let stream = match stream.and_then(|stream| {
                    stream
                        .play()
                        .map_err(|e| AudioError::Device(e.to_string()))?;
                    Ok(stream)
                }) {
                    Ok(stream) => {
                        let _ = started_tx.send(Ok(()));
                        stream
                    }
                    Err(e) => {
                        let _ = started_tx.send(Err(e));
                        return;
                    }
                };

                // Keep the stream alive until shutdown is requested.
                let _ = shutdown_rx.recv();
                drop(stream);
            })
        };

        match started_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(AudioError::Device("output thread exited".to_string())),
        }

        info!(
            device = name,
            channels = num_channels,
            sample_rate,
            "cpal output stream started"
        );

        Ok(Device {
            name,
            host_id,
            sample_rate,
            num_channels,
            mixer,
            sounds,
            load_tx,
            next_voice: AtomicU64::new(1),
            shutdown_tx,
            output_thread: Some(output_thread),
        })
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.try_send(());
        if let Some(thread) = self.output_thread.take() {
            let _ = thread.join();
        }
    }
}

impl super::Device for Device {
    fn load(&self, asset: AssetId, path: &Path) {
        info!(device = self.name, %asset, path = ?path, "Loading sound.");
        let job = LoadJob {
            asset,
            path: path.to_path_buf(),
        };
        if let Err(e) = self.load_tx.send(job) {
            error!(err = %e, "Sound loader is gone");
        }
    }

    fn play(
        &self,
        asset: AssetId,
        left: f32,
        right: f32,
        loop_mode: LoopMode,
        rate: f32,
    ) -> VoiceId {
        let Some(sound) = self.sounds.read().get(&asset).cloned() else {
            return VoiceId::NONE;
        };

        let voice = VoiceId::new(self.next_voice.fetch_add(1, Ordering::Relaxed));
        self.mixer
            .lock()
            .add_voice(voice, sound, left, right, loop_mode, rate);
        voice
    }

    fn set_volume(&self, voice: VoiceId, left: f32, right: f32) {
        self.mixer.lock().set_volume(voice, left, right);
    }

    fn set_rate(&self, voice: VoiceId, rate: f32) {
        self.mixer.lock().set_rate(voice, rate);
    }

    fn stop(&self, voice: VoiceId) {
        self.mixer.lock().stop(voice);
    }

    fn is_playing(&self, voice: VoiceId) -> bool {
        self.mixer.lock().is_playing(voice)
    }
}
