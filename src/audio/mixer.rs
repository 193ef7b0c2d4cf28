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
// Core voice mixing logic, independent of any audio backend.
use std::sync::Arc;

use super::{LoopMode, VoiceId};

/// A sound held entirely in memory at the output sample rate.
/// The data is shared between all voices playing it.
#[derive(Clone, Debug)]
pub struct Sound {
    /// Interleaved samples.
    data: Arc<Vec<f32>>,
    /// Number of channels in the data.
    channels: u16,
}

impl Sound {
    /// Creates a new sound from interleaved samples.
    pub fn new(data: Vec<f32>, channels: u16) -> Sound {
        Sound {
            data: Arc::new(data),
            channels: channels.max(1),
        }
    }

    /// Returns the number of channels.
    pub fn channel_count(&self) -> u16 {
        self.channels
    }

    /// Returns the number of frames.
    pub fn frame_count(&self) -> usize {
        self.data.len() / self.channels as usize
    }

    /// Returns the sample for the given frame and source channel. Channels past the
    /// end of the sound fold back onto the last one, so mono feeds both sides.
    #[inline]
    fn sample(&self, frame: usize, channel: usize) -> f32 {
        let channel = channel.min(self.channels as usize - 1);
        self.data[frame * self.channels as usize + channel]
    }
}

/// A voice being rendered by the mixer.
struct MixerVoice {
    id: VoiceId,
    sound: Sound,
    /// Fractional read position in frames.
    position: f64,
    left: f32,
    right: f32,
    rate: f32,
    loop_mode: LoopMode,
    finished: bool,
}

impl MixerVoice {
    /// Reads one interpolated stereo frame and advances the read position.
    fn next_frame(&mut self) -> (f32, f32) {
        let frames = self.sound.frame_count();
        if frames == 0 {
            self.finished = true;
            return (0.0, 0.0);
        }

        let index = self.position.floor() as usize;
        let frac = (self.position - index as f64) as f32;
        let next = if index + 1 < frames {
            Some(index + 1)
        } else if self.loop_mode == LoopMode::Forever {
            Some(0)
        } else {
            None
        };

        let mut out = [0.0f32; 2];
        for (channel, out) in out.iter_mut().enumerate() {
            let s0 = self.sound.sample(index, channel);
            let s1 = next.map(|n| self.sound.sample(n, channel)).unwrap_or(s0);
            *out = s0 + (s1 - s0) * frac;
        }

        self.position += self.rate.max(0.0) as f64;
        if self.position >= frames as f64 {
            match self.loop_mode {
                LoopMode::Forever => self.position %= frames as f64,
                LoopMode::Once => self.finished = true,
            }
        }

        (out[0] * self.left, out[1] * self.right)
    }
}

/// Mixes voices into an interleaved output buffer.
pub struct Mixer {
    /// Number of output channels.
    num_channels: u16,
    /// Voices currently sounding.
    voices: Vec<MixerVoice>,
}

impl Mixer {
    /// Creates a new mixer for the given number of output channels.
    pub fn new(num_channels: u16) -> Mixer {
        Mixer {
            num_channels: num_channels.max(1),
            voices: Vec::new(),
        }
    }

    /// Starts a new voice.
    pub fn add_voice(
        &mut self,
        id: VoiceId,
        sound: Sound,
        left: f32,
        right: f32,
        loop_mode: LoopMode,
        rate: f32,
    ) {
        self.voices.push(MixerVoice {
            id,
            sound,
            position: 0.0,
            left,
            right,
            rate,
            loop_mode,
            finished: false,
        });
    }

    fn voice_mut(&mut self, id: VoiceId) -> Option<&mut MixerVoice> {
        self.voices.iter_mut().find(|voice| voice.id == id)
    }

    /// Sets the volume of a voice. Unknown voices are ignored.
    pub fn set_volume(&mut self, id: VoiceId, left: f32, right: f32) {
        if let Some(voice) = self.voice_mut(id) {
            voice.left = left;
            voice.right = right;
        }
    }

    /// Sets the playback rate of a voice. Unknown voices are ignored.
    pub fn set_rate(&mut self, id: VoiceId, rate: f32) {
        if let Some(voice) = self.voice_mut(id) {
            voice.rate = rate;
        }
    }

    /// Removes a voice.
    pub fn stop(&mut self, id: VoiceId) {
        self.voices.retain(|voice| voice.id != id);
    }

    /// Returns true if the voice is still sounding.
    pub fn is_playing(&self, id: VoiceId) -> bool {
        self.voices.iter().any(|voice| voice.id == id)
    }

    /// Returns the number of voices currently sounding.
    pub fn active_count(&self) -> usize {
        self.voices.len()
    }

    /// Renders interleaved frames into the output buffer, replacing its contents.
    /// Finished one-shot voices are dropped at the end of the buffer.
    pub fn process_into_output(&mut self, output: &mut [f32]) {
        output.fill(0.0);
        let channels = self.num_channels as usize;

        for frame in output.chunks_mut(channels) {
            for voice in self.voices.iter_mut().filter(|voice| !voice.finished) {
                let (left, right) = voice.next_frame();
                if frame.len() == 1 {
                    frame[0] += (left + right) * 0.5;
                } else {
                    frame[0] += left;
                    frame[1] += right;
                }
            }
        }

        for sample in output.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }

        self.voices.retain(|voice| !voice.finished);
    }
}
