//! # DSP (Digital Signal Processing) Building Blocks
//!
//! - **`ramp`**: Linear gain ramps over ring-buffer spans, split at the
//!   wrap boundary. Every copy in or out of the tape loop goes through here.
//!
//! - **`delay_store`**: The multi-channel ring buffer ("tape loop") that
//!   holds recorded audio.
//!
//! - **`engine`**: The per-block delay cycle: record, play back with a
//!   crossfade on delay-time changes, record the feedback, advance.

pub mod delay_store;
pub mod engine;
pub mod ramp;
