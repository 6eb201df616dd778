//! # Gain Ramps Over Ring-Buffer Spans
//!
//! Every transfer between the host's audio block and the delay store goes
//! through one primitive: copy a span of samples while multiplying by a
//! gain that moves in a straight line from `start_gain` to `end_gain`.
//!
//! ## Ramp shape
//!
//! For a span of `len` samples, sample `i` receives the gain at fraction
//! `(i + 1) / len` of the way from start to end:
//!
//! ```text
//! start ─┐
//!        └─ s[0] ── s[1] ── ... ── s[len-1] = end
//! ```
//!
//! The start gain is the value the *previous* block finished on, so the
//! first sample of this block is already one step past it, and the last
//! sample lands exactly on `end_gain`. Chained blocks therefore form one
//! unbroken line with no repeated or skipped gain value at block seams.
//!
//! ## Wrap splitting
//!
//! A span `[pos, pos + len)` on a ring of `capacity` samples may run off
//! the end of the buffer. It is then stored in two physically disjoint
//! pieces:
//!
//! ```text
//! ring:  [ tail ..........|..................| head ....... ]
//!         0        len-mid_len             pos        capacity
//! ```
//!
//! The gain at the seam is evaluated at fraction `mid_len / len` and used
//! as the end of the first piece and the start of the second. Because the
//! ramp formula above is exact under this subdivision, the two pieces
//! together produce the same line as an unsplit ramp would.

/// How a ramped span combines with what is already at the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampMode {
    /// Overwrite the destination samples.
    Replace,
    /// Add onto the destination samples.
    Accumulate,
}

/// Linear interpolation between two gains, exact at both endpoints.
#[inline]
pub fn lerp_gain(start_gain: f32, end_gain: f32, t: f32) -> f32 {
    start_gain * (1.0 - t) + end_gain * t
}

/// Copy (or add) `src` into `dest` under a linear gain ramp.
///
/// Only the overlapping prefix `min(dest.len(), src.len())` is touched.
/// An empty span is a no-op.
pub fn apply_ramp(dest: &mut [f32], src: &[f32], start_gain: f32, end_gain: f32, mode: RampMode) {
    let len = dest.len().min(src.len());
    if len == 0 {
        return;
    }

    let (dest, src) = (&mut dest[..len], &src[..len]);

    // A flat ramp is a plain scaled copy. Going through lerp_gain here
    // would let `g * (1 - t) + g * t` drift off `g` by an ulp.
    if start_gain == end_gain {
        match mode {
            RampMode::Replace => dest
                .iter_mut()
                .zip(src)
                .for_each(|(d, s)| *d = s * start_gain),
            RampMode::Accumulate => dest
                .iter_mut()
                .zip(src)
                .for_each(|(d, s)| *d += s * start_gain),
        }
        return;
    }

    let len_f = len as f32;
    for (i, (d, s)) in dest.iter_mut().zip(src).enumerate() {
        let gain = lerp_gain(start_gain, end_gain, (i + 1) as f32 / len_f);
        match mode {
            RampMode::Replace => *d = s * gain,
            RampMode::Accumulate => *d += s * gain,
        }
    }
}

/// One physically contiguous piece of a ramped ring span.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampSegment {
    /// Index into the ring where this piece starts.
    pub ring_start: usize,
    /// Offset of this piece within the linear (block-side) span.
    pub offset: usize,
    /// Number of samples in this piece.
    pub len: usize,
    pub start_gain: f32,
    pub end_gain: f32,
}

/// A linear gain ramp over `[pos, pos + len)` on a ring of `capacity`
/// samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingRamp {
    pub pos: usize,
    pub len: usize,
    pub capacity: usize,
    pub start_gain: f32,
    pub end_gain: f32,
}

impl RingRamp {
    /// Split the span at the ring boundary.
    ///
    /// Returns the piece starting at `pos` and, when the span wraps, the
    /// piece continuing from index 0. Requires `pos < capacity` and
    /// `len <= capacity`, so at most one wrap can occur.
    pub fn segments(&self) -> (RampSegment, Option<RampSegment>) {
        debug_assert!(self.pos < self.capacity);
        debug_assert!(self.len <= self.capacity);

        if self.pos + self.len <= self.capacity {
            return (
                RampSegment {
                    ring_start: self.pos,
                    offset: 0,
                    len: self.len,
                    start_gain: self.start_gain,
                    end_gain: self.end_gain,
                },
                None,
            );
        }

        // The span runs off the end of the ring, so it is written as two
        // pieces: [pos, capacity) then [0, len - mid_len). Each piece gets
        // its own ramp, and the two ramps have to meet at the seam or the
        // gain would jump there.
        //
        // Sample i of the whole span sits at fraction (i + 1) / len. The
        // first piece covers samples 0..mid_len, so its last sample is at
        // mid_len / len; that is the seam gain. The second piece starts
        // from the seam gain and its samples continue at (mid_len + j + 1)
        // / len, which is the same line as the unsplit ramp.
        //
        // A flat ramp skips the lerp so the seam gain is bit-identical to
        // the start gain and unity stays a plain copy.
        let mid_len = self.capacity - self.pos;
        let mid_gain = if self.start_gain == self.end_gain {
            self.start_gain
        } else {
            lerp_gain(
                self.start_gain,
                self.end_gain,
                mid_len as f32 / self.len as f32,
            )
        };

        (
            RampSegment {
                ring_start: self.pos,
                offset: 0,
                len: mid_len,
                start_gain: self.start_gain,
                end_gain: mid_gain,
            },
            Some(RampSegment {
                ring_start: 0,
                offset: mid_len,
                len: self.len - mid_len,
                start_gain: mid_gain,
                end_gain: self.end_gain,
            }),
        )
    }
}

/// Ramp `src` into `ring` starting at ring index `pos`, wrapping at the end.
pub fn write_ring(
    ring: &mut [f32],
    pos: usize,
    src: &[f32],
    start_gain: f32,
    end_gain: f32,
    mode: RampMode,
) {
    let capacity = ring.len();
    if src.is_empty() || capacity == 0 || src.len() > capacity {
        return;
    }

    let ramp = RingRamp {
        pos: pos % capacity,
        len: src.len(),
        capacity,
        start_gain,
        end_gain,
    };
    let (head, tail) = ramp.segments();
    for seg in std::iter::once(head).chain(tail) {
        apply_ramp(
            &mut ring[seg.ring_start..seg.ring_start + seg.len],
            &src[seg.offset..seg.offset + seg.len],
            seg.start_gain,
            seg.end_gain,
            mode,
        );
    }
}

/// Ramp `dest.len()` samples out of `ring`, starting at ring index `pos`.
pub fn read_ring(
    dest: &mut [f32],
    ring: &[f32],
    pos: usize,
    start_gain: f32,
    end_gain: f32,
    mode: RampMode,
) {
    let capacity = ring.len();
    if dest.is_empty() || capacity == 0 || dest.len() > capacity {
        return;
    }

    let ramp = RingRamp {
        pos: pos % capacity,
        len: dest.len(),
        capacity,
        start_gain,
        end_gain,
    };
    let (head, tail) = ramp.segments();
    for seg in std::iter::once(head).chain(tail) {
        apply_ramp(
            &mut dest[seg.offset..seg.offset + seg.len],
            &ring[seg.ring_start..seg.ring_start + seg.len],
            seg.start_gain,
            seg.end_gain,
            mode,
        );
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
