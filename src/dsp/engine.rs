//! # Tape Delay Engine
//!
//! Block-based delay with feedback, built on the [`DelayStore`]. One call
//! to [`TapeDelayEngine::process_block`] runs the whole per-block cycle:
//!
//! ```text
//!  input ──► × gain ramp ──► [store @ write_pos] (replace)
//!                                   │
//!                  read @ write_pos − delay (crossfaded on time change)
//!                                   │
//!                                   ▼
//!                                output ──► × feedback ramp ──► [store @ write_pos] (add)
//!
//!  write_pos += block_len (mod capacity)
//! ```
//!
//! ## Delay-time changes
//!
//! Moving the read head abruptly would splice two unrelated parts of the
//! tape together and click. Instead the engine remembers where the read
//! head *would* be next block if nothing changed (`expected_read_pos`).
//! When the requested position differs, the block is rendered twice and
//! summed: the old position fading out `1 → 0`, the new one fading in
//! `0 → 1`. The two ramps sum to unity gain at every sample.

use nih_plug::nih_debug_assert;

use super::delay_store::DelayStore;
use super::ramp::RampMode;

/// Parameter values for one block, read once before processing starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSnapshot {
    /// Dry input level written into the store.
    pub gain: f32,
    /// Delay length in milliseconds.
    pub time_ms: f32,
    /// Level at which the delayed output is written back into the store.
    pub feedback: f32,
}

/// Shape of the store for one processing session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub sample_rate: f32,
    /// Largest block the host will ever pass to `process_block()`.
    pub max_block_size: usize,
    /// Number of input channels recorded into the store.
    pub num_channels: usize,
}

impl EngineConfig {
    /// Samples per channel ring: two seconds plus two blocks of headroom.
    pub fn capacity(&self) -> usize {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return 0;
        }
        (2.0 * (self.max_block_size as f64 + self.sample_rate as f64)) as usize
    }
}

/// How the read path produced the current block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadTransition {
    /// First block after configuration; no previous read position exists.
    Cold,
    /// Delay time unchanged; plain read continuing the previous block.
    Steady,
    /// Delay time changed; crossfade from the old read position `from`.
    Crossfade { from: usize },
}

/// Audio-thread state of the tape delay.
///
/// Created empty, sized by [`configure()`](Self::configure) during plugin
/// initialization, then driven block by block from `process()`.
#[derive(Debug)]
pub struct TapeDelayEngine {
    store: DelayStore,

    sample_rate: f32,
    max_block_size: usize,

    /// Ring index where the next block will be recorded.
    write_pos: usize,

    /// Where the read head lands next block if the delay time holds.
    /// `None` until the first block has been read.
    expected_read_pos: Option<usize>,

    /// Gains in force at the end of the previous block. These are the
    /// ramp start points for the next block. They start at 0.0, so the
    /// first block after configuration or reset fades in from silence
    /// instead of switching the input on at full level.
    last_input_gain: f32,
    last_feedback_gain: f32,
}

impl Default for TapeDelayEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TapeDelayEngine {
    pub fn new() -> Self {
        Self {
            store: DelayStore::new(),
            sample_rate: 0.0,
            max_block_size: 0,
            write_pos: 0,
            expected_read_pos: None,
            last_input_gain: 0.0,
            last_feedback_gain: 0.0,
        }
    }

    /// (Re)allocate the store for a new session and reset all cursors.
    ///
    /// Returns the resulting ring capacity, or `None` if the configuration
    /// cannot hold any audio (no channels, or a zero sample rate).
    pub fn configure(&mut self, config: EngineConfig) -> Option<usize> {
        let capacity = config.capacity();
        if capacity == 0 || config.num_channels == 0 {
            self.store.allocate(0, 0);
            return None;
        }

        self.sample_rate = config.sample_rate;
        self.max_block_size = config.max_block_size;
        self.store.allocate(config.num_channels, capacity);
        self.reset_cursors();

        Some(capacity)
    }

    /// Silence the store and reset cursors, keeping the allocation.
    pub fn reset(&mut self) {
        self.store.clear();
        self.reset_cursors();
    }

    fn reset_cursors(&mut self) {
        self.write_pos = 0;
        self.expected_read_pos = None;
        self.last_input_gain = 0.0;
        self.last_feedback_gain = 0.0;
    }

    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    pub fn num_channels(&self) -> usize {
        self.store.num_channels()
    }

    #[cfg(test)]
    pub(crate) fn write_pos(&self) -> usize {
        self.write_pos
    }

    #[cfg(test)]
    pub(crate) fn expected_read_pos(&self) -> Option<usize> {
        self.expected_read_pos
    }

    /// Delay length in whole samples for `time_ms`.
    ///
    /// Rounded to the nearest sample and capped at `capacity − max_block_size`
    /// so the read span of a block never overtakes the write cursor.
    pub fn delay_samples(&self, time_ms: f32) -> usize {
        let max_delay = self.capacity().saturating_sub(self.max_block_size);
        let samples = (self.sample_rate as f64 * time_ms as f64 / 1000.0).round();
        if samples.is_nan() || samples <= 0.0 {
            return 0;
        }
        (samples as usize).min(max_delay)
    }

    /// Ring index the read head needs for `time_ms` at the current write cursor.
    pub fn read_pos(&self, time_ms: f32) -> usize {
        let capacity = self.capacity();
        if capacity == 0 {
            return 0;
        }
        (self.write_pos + capacity - self.delay_samples(time_ms)) % capacity
    }

    /// Run one block through the delay, in place.
    ///
    /// `channels` holds the host's buffer; the first `num_input_channels`
    /// of them carry input and are recorded into the store. On return
    /// every channel holds the delayed signal.
    ///
    /// Returns how the read path rendered the block, or `None` when the
    /// block was skipped (empty block, unconfigured engine, or a block
    /// longer than the store can hold).
    pub fn process_block(
        &mut self,
        channels: &mut [&mut [f32]],
        num_input_channels: usize,
        params: ParamSnapshot,
    ) -> Option<ReadTransition> {
        let block_len = channels.first().map_or(0, |c| c.len());
        let capacity = self.capacity();
        if block_len == 0 || !self.store.is_allocated() {
            return None;
        }

        nih_debug_assert!(block_len <= self.max_block_size);
        if block_len > capacity {
            return None;
        }

        let num_inputs = num_input_channels.min(channels.len());

        // Dry input. Recorded first so a zero delay time reads it straight back.
        self.write_inputs(
            &channels[..num_inputs],
            self.last_input_gain,
            params.gain,
            RampMode::Replace,
        );
        self.last_input_gain = params.gain;

        let read_pos = self.read_pos(params.time_ms);
        let transition = self.read_delayed(channels, read_pos, block_len);

        // Regeneration: the delayed output goes back onto the dry signal
        // recorded at this same write position.
        self.write_inputs(
            &channels[..num_inputs],
            self.last_feedback_gain,
            params.feedback,
            RampMode::Accumulate,
        );
        self.last_feedback_gain = params.feedback;

        self.write_pos = (self.write_pos + block_len) % capacity;

        Some(transition)
    }

    fn write_inputs(
        &mut self,
        channels: &[&mut [f32]],
        start_gain: f32,
        end_gain: f32,
        mode: RampMode,
    ) {
        for (channel, samples) in channels.iter().enumerate() {
            self.store
                .write_span(channel, self.write_pos, samples, start_gain, end_gain, mode);
        }
    }

    fn read_delayed(
        &mut self,
        channels: &mut [&mut [f32]],
        read_pos: usize,
        block_len: usize,
    ) -> ReadTransition {
        // The previous block predicted where this block's read would start
        // if the delay time stayed put. A mismatch means the knob moved.
        let transition = match self.expected_read_pos {
            None => ReadTransition::Cold,
            Some(expected) if expected == read_pos => ReadTransition::Steady,
            Some(expected) => ReadTransition::Crossfade { from: expected },
        };

        for (channel, out) in channels.iter_mut().enumerate() {
            let out = &mut out[..];
            match transition {
                ReadTransition::Cold | ReadTransition::Steady => {
                    self.store
                        .read_span(channel, read_pos, out, 1.0, 1.0, RampMode::Replace);
                }
                ReadTransition::Crossfade { from } => {
                    // Render the block twice into the same output span.
                    //
                    // The first pass reads from where the read head *was*
                    // heading (the continuation of last block's audio) and
                    // fades it out 1 -> 0. It replaces the output, which at
                    // this point still holds the dry input.
                    //
                    // The second pass reads from the newly requested
                    // position and fades it in 0 -> 1 on top. At sample i
                    // the two gains are (1 - t) and t with t = (i+1)/len,
                    // so they always sum to one: no dip in level halfway
                    // through, no overshoot, and by the last sample only
                    // the new tap is left. Next block continues from the
                    // new tap as a plain steady read.
                    self.store
                        .read_span(channel, from, out, 1.0, 0.0, RampMode::Replace);
                    self.store
                        .read_span(channel, read_pos, out, 0.0, 1.0, RampMode::Accumulate);
                }
            }
        }

        self.expected_read_pos = Some((read_pos + block_len) % self.capacity());
        transition
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &DelayStore {
        &self.store
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
