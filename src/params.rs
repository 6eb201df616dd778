//! # Plugin Parameters
//!
//! Three knobs drive the tape delay: input gain, delay time, and feedback.
//! Each `FloatParam` stores its plain value in an atomic, so the host's
//! automation thread and the editor can set it at any time while the audio
//! thread reads it without locking.
//!
//! ## No host-side smoothing
//!
//! Unlike most nih-plug effects, these parameters carry no smoother. The
//! audio thread reads each one exactly once per block via
//! [`TapeDelayParams::snapshot()`], and the engine hides the change
//! itself: gains are ramped linearly across the block, and a new delay
//! time is crossfaded in over one block. A smoother would instead move
//! the read head a little every block and trigger a crossfade each time.
//!
//! The string IDs (`gain`, `time`, `feedback`) are what the host stores in
//! presets and sessions. Never rename them.

use nih_plug::prelude::*;

use crate::dsp::engine::ParamSnapshot;

/// All user-facing parameters for the tape delay.
///
/// `#[derive(Params)]` registers these with the host and serializes
/// their values into the plugin state for session recall.
#[derive(Params)]
pub struct TapeDelayParams {
    /// **Gain**: level of the dry input recorded onto the tape.
    ///
    /// Range 0.0 to 2.0 (up to +6 dB), default 1.0 (unity).
    #[id = "gain"]
    pub gain: FloatParam,

    /// **Time**: distance between the write and read heads.
    ///
    /// Range 0 to 2000 ms in whole milliseconds, default 200 ms.
    #[id = "time"]
    pub time: FloatParam,

    /// **Feedback**: how much of the delayed signal is recorded back
    /// onto the tape.
    ///
    /// Range 0.0 to 2.0, default 0.6. Values of 1.0 and above never
    /// decay; above 1.0 each repeat is louder than the last.
    #[id = "feedback"]
    pub feedback: FloatParam,
}

impl TapeDelayParams {
    /// Read all three values once, for the block about to be processed.
    pub fn snapshot(&self) -> ParamSnapshot {
        ParamSnapshot {
            gain: self.gain.value(),
            time_ms: self.time.value(),
            feedback: self.feedback.value(),
        }
    }
}

impl Default for TapeDelayParams {
    fn default() -> Self {
        Self {
            gain: FloatParam::new("Gain", 1.0, FloatRange::Linear { min: 0.0, max: 2.0 })
                .with_step_size(0.1)
                .with_value_to_string(formatters::v2s_f32_rounded(1)),

            time: FloatParam::new(
                "Time",
                200.0,
                FloatRange::Linear {
                    min: 0.0,
                    max: 2000.0,
                },
            )
            .with_unit(" ms")
            .with_step_size(1.0),

            feedback: FloatParam::new(
                "Feedback",
                0.6,
                FloatRange::Linear { min: 0.0, max: 2.0 },
            )
            .with_step_size(0.1)
            .with_value_to_string(formatters::v2s_f32_rounded(1)),
        }
    }
}
