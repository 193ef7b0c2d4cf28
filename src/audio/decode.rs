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

//! Whole-file decoding of sounds into memory.
//!
//! Sounds are short, so they are decoded entirely up front and converted to the
//! output sample rate once. The mixer only interpolates for varispeed.

use std::fs::File;
use std::io;
use std::path::Path;
use std::time::Duration;

use rubato::{
    SincFixedIn, SincInterpolationParameters, SincInterpolationType, VecResampler, WindowFunction,
};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};
use tracing::{debug, info, warn};

use super::error::AudioError;
use super::mixer::Sound;

/// Input block size for the sinc resampler.
const INPUT_BLOCK_SIZE: usize = 1024;

/// Interleaved f32 audio decoded from a file.
#[derive(Clone, Debug)]
pub struct DecodedAudio {
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
}

impl DecodedAudio {
    /// Returns the number of channels.
    pub fn channel_count(&self) -> u16 {
        self.channels
    }

    /// Returns the sample rate of the decoded data.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns the number of frames (samples per channel).
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    /// Returns the playback duration.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frame_count() as f64 / self.sample_rate as f64)
    }

    /// Converts the audio into a mixer sound at the given output sample rate.
    pub fn into_sound(self, target_rate: u32) -> Result<Sound, AudioError> {
        if self.sample_rate == target_rate {
            return Ok(Sound::new(self.samples, self.channels));
        }

        debug!(
            source_rate = self.sample_rate,
            target_rate, "Resampling sound"
        );
        let samples = resample(&self.samples, self.channels, self.sample_rate, target_rate)?;
        Ok(Sound::new(samples, self.channels))
    }
}

/// Decodes an entire audio file (WAV, FLAC, MP3, OGG, ...) into memory.
pub fn decode_file(path: &Path) -> Result<DecodedAudio, AudioError> {
    let file = File::open(path).map_err(|e| {
        AudioError::Io(io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let probed = get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format_reader = probed.format;

    let track = format_reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::NoTrack(path.display().to_string()))?;
    let track_id = track.id;
    let params = track.codec_params.clone();

    let sample_rate = params
        .sample_rate
        .ok_or_else(|| AudioError::UnknownSampleRate(path.display().to_string()))?;
    let mut channels = params.channels.map(|c| c.count() as u16).unwrap_or(0);

    let mut decoder = get_codecs().make(&params, &DecoderOptions::default())?;

    let mut samples: Vec<f32> = Vec::new();
    loop {
        let packet = match format_reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                warn!(path = ?path, err = e, "Skipping undecodable packet");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        if channels == 0 {
            channels = spec.channels.count() as u16;
        }

        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buffer.samples());
    }

    if channels == 0 {
        return Err(AudioError::NoTrack(path.display().to_string()));
    }

    let decoded = DecodedAudio {
        samples,
        channels,
        sample_rate,
    };

    info!(
        path = ?path,
        channels,
        sample_rate,
        duration_ms = decoded.duration().as_millis(),
        "Sound decoded"
    );

    Ok(decoded)
}

/// Converts interleaved samples from one sample rate to another with a sinc
/// resampler. The resampler delay is trimmed off, so the output lines up with the
/// input and holds `ceil(frames * ratio)` frames.
pub fn resample(
    samples: &[f32],
    channel_count: u16,
    source_rate: u32,
    target_rate: u32,
) -> Result<Vec<f32>, AudioError> {
    let channels = channel_count.max(1) as usize;
    let failed = |_| AudioError::Resampling(source_rate, target_rate);

    let sinc_params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        oversampling_factor: 128,
        interpolation: SincInterpolationType::Linear,
        window: WindowFunction::BlackmanHarris2,
    };
    let ratio = target_rate as f64 / source_rate as f64;
    let mut resampler =
        SincFixedIn::<f32>::new(ratio, 1.0, sinc_params, INPUT_BLOCK_SIZE, channels)
            .map_err(|_e| AudioError::Resampling(source_rate, target_rate))?;

    // Rubato works on planar audio.
    let source_frames = samples.len() / channels;
    let mut planar = vec![Vec::with_capacity(source_frames); channels];
    for frame in samples.chunks_exact(channels) {
        for (channel, sample) in planar.iter_mut().zip(frame) {
            channel.push(*sample);
        }
    }

    let target_frames = (source_frames as f64 * ratio).ceil() as usize;
    let delay = resampler.output_delay();
    let mut output = vec![Vec::with_capacity(target_frames + delay); channels];
    let mut scratch = resampler.output_buffer_allocate(true);

    let mut position = 0;
    while source_frames - position >= resampler.input_frames_next() {
        let needed = resampler.input_frames_next();
        let block: Vec<Vec<f32>> = planar
            .iter()
            .map(|channel| channel[position..position + needed].to_vec())
            .collect();
        let (consumed, produced) = resampler
            .process_into_buffer(&block, &mut scratch, None)
            .map_err(failed)?;
        position += consumed;
        push_planar(&mut output, &scratch, produced);
    }

    if position < source_frames {
        let rest: Vec<Vec<f32>> = planar
            .iter()
            .map(|channel| channel[position..].to_vec())
            .collect();
        let (_consumed, produced) = resampler
            .process_partial_into_buffer(Some(&rest as &[Vec<f32>]), &mut scratch, None)
            .map_err(failed)?;
        push_planar(&mut output, &scratch, produced);
    }

    // Flush the delay line.
    while output[0].len() < target_frames + delay {
        let (_consumed, produced) = resampler
            .process_partial_into_buffer(None::<&[Vec<f32>]>, &mut scratch, None)
            .map_err(failed)?;
        if produced == 0 {
            break;
        }
        push_planar(&mut output, &scratch, produced);
    }

    let frames = output[0].len().saturating_sub(delay).min(target_frames);
    let mut interleaved = Vec::with_capacity(frames * channels);
    for frame in delay..delay + frames {
        for channel in &output {
            interleaved.push(channel[frame]);
        }
    }
    Ok(interleaved)
}

fn push_planar(output: &mut [Vec<f32>], scratch: &[Vec<f32>], frames: usize) {
    for (channel, produced) in output.iter_mut().zip(scratch) {
        channel.extend_from_slice(&produced[..frames.min(produced.len())]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::write_test_wav;

    #[test]
    fn test_decode_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hum.wav");
        write_test_wav(&path, 22050, 2, 2205).unwrap();

        let decoded = decode_file(&path).unwrap();
        assert_eq!(decoded.channel_count(), 2);
        assert_eq!(decoded.sample_rate(), 22050);
        assert_eq!(decoded.frame_count(), 2205);
        assert_eq!(decoded.duration().as_millis(), 100);
    }

    #[test]
    fn test_decode_missing_file() {
        let result = decode_file(Path::new("/nonexistent/ignite.wav"));
        assert!(matches!(result, Err(AudioError::Io(_))));
    }

    #[test]
    fn test_decode_into_sound_resamples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("impact.wav");
        write_test_wav(&path, 22050, 1, 1000).unwrap();

        let sound = decode_file(&path).unwrap().into_sound(44100).unwrap();
        assert_eq!(sound.channel_count(), 1);
        assert_eq!(sound.frame_count(), 2000);
    }

    #[test]
    fn test_decode_into_sound_same_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hum.wav");
        write_test_wav(&path, 48000, 2, 480).unwrap();

        let sound = decode_file(&path).unwrap().into_sound(48000).unwrap();
        assert_eq!(sound.channel_count(), 2);
        assert_eq!(sound.frame_count(), 480);
    }

    #[test]
    fn test_resample_stereo() {
        // Stereo: L=1.0, R=-1.0 throughout.
        let source: Vec<f32> = std::iter::repeat([1.0f32, -1.0])
            .take(4096)
            .flatten()
            .collect();

        let result = resample(&source, 2, 44100, 48000).unwrap();

        // ceil(4096 * 48000 / 44100)
        assert_eq!(result.len(), 4459 * 2);
        // The edges ramp against the zero padding, the middle holds the level.
        for frame in result.chunks(2).skip(1000).take(2000) {
            assert!((frame[0] - 1.0).abs() < 1e-2);
            assert!((frame[1] + 1.0).abs() < 1e-2);
        }
    }

    #[test]
    fn test_resample_short_input() {
        // Shorter than a single resampler block.
        let source: Vec<f32> = (0..100).map(|i| i as f32 / 100.0).collect();
        let result = resample(&source, 1, 48000, 44100).unwrap();
        assert_eq!(result.len(), 92);
    }
}
