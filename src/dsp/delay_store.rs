//! # Delay Store (Multi-Channel Ring Buffer)
//!
//! The store is the "tape" of the tape delay: one circular buffer per
//! channel, all of the same `capacity`. A write head records each incoming
//! block at the write cursor, and a read head plays back from a position
//! further behind on the loop. The distance between the two heads is the
//! delay time.
//!
//! Unlike a per-sample delay line, the store moves whole blocks at a time.
//! Every block transfer goes through [`write_ring`]/[`read_ring`], which
//! split a span at the end of the ring and apply a gain ramp across it.
//!
//! ## Sizing
//!
//! Capacity is `2 × (max_block_size + sample_rate)`: two seconds of audio
//! plus two blocks of headroom. The longest addressable delay is capped at
//! `capacity − max_block_size`, which keeps a block's read span from
//! running into the span being written in the same block.

use super::ramp::{read_ring, write_ring, RampMode};

/// A fixed-capacity, multi-channel ring buffer of audio samples.
///
/// Allocated once per configuration (in `initialize()`), then only
/// written and read in place. An unallocated store has zero capacity and
/// every operation on it is a no-op.
#[derive(Debug, Default)]
pub struct DelayStore {
    /// One ring per channel, each exactly `capacity` samples long.
    channels: Vec<Vec<f32>>,

    capacity: usize,
}

impl DelayStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size the store to `num_channels` rings of `capacity` samples and
    /// fill them with silence.
    ///
    /// Calling this again with the same shape only clears the contents.
    /// Must not be called while a block is being processed.
    pub fn allocate(&mut self, num_channels: usize, capacity: usize) {
        self.channels.resize_with(num_channels, Vec::new);
        for ring in &mut self.channels {
            ring.clear();
            ring.resize(capacity, 0.0);
        }
        self.capacity = capacity;
    }

    /// Fill every ring with silence, keeping the allocation.
    pub fn clear(&mut self) {
        for ring in &mut self.channels {
            ring.fill(0.0);
        }
    }

    /// Samples per channel ring.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// True once the store can hold at least one sample per channel.
    pub fn is_allocated(&self) -> bool {
        self.capacity > 0 && !self.channels.is_empty()
    }

    /// Ring for a logical channel.
    ///
    /// Hosts may present more channels than the store was sized for (mono
    /// in, stereo out). Those channels share rings by wrapping the index,
    /// so channel 1 of a mono store reads channel 0.
    fn ring_index(&self, channel: usize) -> Option<usize> {
        match self.channels.len() {
            0 => None,
            n => Some(channel % n),
        }
    }

    /// Ramp `src` into the ring for `channel`, starting at ring index `pos`.
    pub fn write_span(
        &mut self,
        channel: usize,
        pos: usize,
        src: &[f32],
        start_gain: f32,
        end_gain: f32,
        mode: RampMode,
    ) {
        let Some(idx) = self.ring_index(channel) else {
            return;
        };
        write_ring(&mut self.channels[idx], pos, src, start_gain, end_gain, mode);
    }

    /// Ramp `dest.len()` samples from the ring for `channel`, starting at
    /// ring index `pos`, into `dest`.
    pub fn read_span(
        &self,
        channel: usize,
        pos: usize,
        dest: &mut [f32],
        start_gain: f32,
        end_gain: f32,
        mode: RampMode,
    ) {
        let Some(idx) = self.ring_index(channel) else {
            return;
        };
        read_ring(dest, &self.channels[idx], pos, start_gain, end_gain, mode);
    }

    #[cfg(test)]
    pub(crate) fn ring(&self, channel: usize) -> &[f32] {
        &self.channels[channel]
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
