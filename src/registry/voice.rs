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

//! Voice bookkeeping for the registry.
//!
//! Handles pool capacity and priority-based voice stealing.

use crate::audio::{AssetId, LoopMode, Priority, VoiceId};

/// Represents a voice the registry believes is sounding.
#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
    /// Device voice ID.
    pub id: VoiceId,
    /// The asset being played.
    pub asset: AssetId,
    /// Eviction tier.
    pub priority: Priority,
    /// Whether the voice loops.
    pub loop_mode: LoopMode,
    /// Left channel volume.
    pub left: f32,
    /// Right channel volume.
    pub right: f32,
    /// Playback rate multiplier.
    pub rate: f32,
    /// Allocation order. Lower is older.
    sequence: u64,
}

/// What the pool decided about a new voice request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// There is a free slot.
    Free,
    /// The given voice must be stopped to make room.
    Evict(VoiceId),
    /// Every voice outranks the request.
    Rejected,
}

/// A bounded set of voices ordered by allocation.
pub struct VoicePool {
    /// Active voices.
    voices: Vec<Voice>,
    /// Maximum number of voices.
    capacity: usize,
    /// Next allocation sequence number.
    next_sequence: u64,
}

impl VoicePool {
    /// Creates a new voice pool. Capacity is at least 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            voices: Vec::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
            next_sequence: 0,
        }
    }

    /// Decides whether a voice with the given priority fits. When full, the victim is
    /// the lowest priority voice, oldest among equals, and only if it does not outrank
    /// the request.
    pub fn admit(&self, priority: Priority) -> Admission {
        if self.voices.len() < self.capacity {
            return Admission::Free;
        }

        match self
            .voices
            .iter()
            .min_by_key(|voice| (voice.priority, voice.sequence))
        {
            Some(victim) if victim.priority <= priority => Admission::Evict(victim.id),
            _ => Admission::Rejected,
        }
    }

    /// Records a new voice. Callers must have made room via `admit` first.
    #[allow(clippy::too_many_arguments)]
    pub fn insert(
        &mut self,
        id: VoiceId,
        asset: AssetId,
        priority: Priority,
        loop_mode: LoopMode,
        left: f32,
        right: f32,
        rate: f32,
    ) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.voices.push(Voice {
            id,
            asset,
            priority,
            loop_mode,
            left,
            right,
            rate,
            sequence,
        });
    }

    /// Removes a voice. Returns it if it was present.
    pub fn remove(&mut self, id: VoiceId) -> Option<Voice> {
        let index = self.voices.iter().position(|voice| voice.id == id)?;
        Some(self.voices.remove(index))
    }

    /// Returns the voice with the given ID.
    pub fn get(&self, id: VoiceId) -> Option<&Voice> {
        self.voices.iter().find(|voice| voice.id == id)
    }

    /// Returns the voice with the given ID mutably.
    pub fn get_mut(&mut self, id: VoiceId) -> Option<&mut Voice> {
        self.voices.iter_mut().find(|voice| voice.id == id)
    }

    /// Keeps only the voices matching the predicate.
    pub fn retain<F: FnMut(&Voice) -> bool>(&mut self, f: F) {
        self.voices.retain(f);
    }

    /// Removes and returns every voice.
    pub fn drain(&mut self) -> Vec<Voice> {
        std::mem::take(&mut self.voices)
    }

    /// Returns the current number of voices.
    pub fn len(&self) -> usize {
        self.voices.len()
    }

    /// Returns true if there are no voices.
    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Returns the pool capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl std::fmt::Debug for VoicePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoicePool")
            .field("active_voices", &self.voices.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(pool: &mut VoicePool, id: u64, priority: Priority) {
        pool.insert(
            VoiceId::new(id),
            AssetId::new(1),
            priority,
            LoopMode::Once,
            0.5,
            0.5,
            1.0,
        );
    }

    #[test]
    fn test_free_until_full() {
        let mut pool = VoicePool::new(2);
        assert_eq!(pool.admit(Priority::Low), Admission::Free);
        add(&mut pool, 1, Priority::High);
        assert_eq!(pool.admit(Priority::Low), Admission::Free);
        add(&mut pool, 2, Priority::High);
        assert_eq!(pool.len(), 2);
        assert_ne!(pool.admit(Priority::High), Admission::Free);
    }

    #[test]
    fn test_steals_lowest_priority_first() {
        let mut pool = VoicePool::new(3);
        add(&mut pool, 1, Priority::High);
        add(&mut pool, 2, Priority::Low);
        add(&mut pool, 3, Priority::High);

        assert_eq!(pool.admit(Priority::High), Admission::Evict(VoiceId::new(2)));
        assert_eq!(pool.admit(Priority::Low), Admission::Evict(VoiceId::new(2)));
    }

    #[test]
    fn test_steals_oldest_among_equals() {
        let mut pool = VoicePool::new(3);
        add(&mut pool, 7, Priority::Low);
        add(&mut pool, 3, Priority::Low);
        add(&mut pool, 5, Priority::Low);

        assert_eq!(pool.admit(Priority::Low), Admission::Evict(VoiceId::new(7)));

        pool.remove(VoiceId::new(7));
        add(&mut pool, 9, Priority::Low);
        assert_eq!(pool.admit(Priority::Low), Admission::Evict(VoiceId::new(3)));
    }

    #[test]
    fn test_low_request_cannot_steal_high() {
        let mut pool = VoicePool::new(2);
        add(&mut pool, 1, Priority::High);
        add(&mut pool, 2, Priority::High);

        assert_eq!(pool.admit(Priority::Low), Admission::Rejected);
        assert_eq!(pool.admit(Priority::High), Admission::Evict(VoiceId::new(1)));
    }

    #[test]
    fn test_remove_and_retain() {
        let mut pool = VoicePool::new(4);
        add(&mut pool, 1, Priority::High);
        add(&mut pool, 2, Priority::Low);
        add(&mut pool, 3, Priority::Low);

        assert!(pool.remove(VoiceId::new(2)).is_some());
        assert!(pool.remove(VoiceId::new(2)).is_none());
        assert_eq!(pool.len(), 2);

        pool.retain(|voice| voice.priority == Priority::High);
        assert_eq!(pool.len(), 1);
        assert!(pool.get(VoiceId::new(1)).is_some());

        let drained = pool.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].id, VoiceId::new(1));
        assert!(pool.is_empty());
        assert_eq!(pool.admit(Priority::Low), Admission::Free);
    }

    #[test]
    fn test_zero_capacity_is_one() {
        let pool = VoicePool::new(0);
        assert_eq!(pool.capacity(), 1);
        assert_eq!(pool.admit(Priority::Low), Admission::Free);
    }
}
