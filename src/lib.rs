//! # Loveless Tape Delay — An AU/VST3/CLAP Tape-Style Delay Plugin
//!
//! A delay/feedback effect built with [nih-plug](https://github.com/robbert-vdh/nih-plug).
//! The audio runs through a block-based "tape loop": each host buffer is
//! recorded onto a ring buffer, played back from further behind, and the
//! playback is recorded again on top of the input to make the repeats.
//!
//! ## Signal Flow
//!
//! ```text
//! Input ──► × gain ──►(+)──► [Delay Store / tape loop] ──► read head ──┬──► Output
//!                      ▲                                               │
//!                      │                                               │
//!                      └────────────────── × feedback ◄────────────────┘
//! ```
//!
//! Gain and feedback changes are ramped across a block. A delay-time
//! change moves the read head by crossfading from the old position to
//! the new one over one block (see [`dsp::engine`]).

mod dsp;
mod params;

use std::num::NonZeroU32;
use std::sync::Arc;

use dsp::engine::{EngineConfig, TapeDelayEngine};
use nih_plug::prelude::*;
use params::TapeDelayParams;

/// The main plugin struct.
///
/// Parameters are shared with the host through an `Arc` and may be set
/// from any thread. The engine is owned by the audio thread and only
/// touched from `initialize()`, `reset()` and `process()`, which the host
/// never runs concurrently.
struct TapeDelay {
    params: Arc<TapeDelayParams>,

    engine: TapeDelayEngine,

    /// Main input channel count from the active layout. Only these
    /// channels are recorded; wider outputs read the recorded rings
    /// round-robin.
    num_input_channels: usize,
}

impl Default for TapeDelay {
    fn default() -> Self {
        Self {
            params: Arc::new(TapeDelayParams::default()),
            // Unallocated until initialize(); process() is a no-op before then.
            engine: TapeDelayEngine::new(),
            num_input_channels: 0,
        }
    }
}

impl Plugin for TapeDelay {
    const NAME: &'static str = "Loveless Tape Delay";
    const VENDOR: &'static str = "Loveless Audio";
    const URL: &'static str = "";
    const EMAIL: &'static str = "steve.loveless@gmail.com";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    // One or two channels in, one or two out, never narrower on the way out.
    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(1),
            main_output_channels: NonZeroU32::new(1),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
        // Mono source on a stereo track: both outputs play the one ring.
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(1),
            main_output_channels: NonZeroU32::new(2),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
    ];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;

    // Parameters are read once per block. Splitting blocks at automation
    // points would turn one knob sweep into a string of short crossfades.
    const SAMPLE_ACCURATE_AUTOMATION: bool = false;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    /// Allocate the delay store for the host's sample rate, maximum block
    /// size and input width. Any previous store and cursors are replaced.
    fn initialize(
        &mut self,
        audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        let Some(num_inputs) = audio_io_layout.main_input_channels.map(NonZeroU32::get) else {
            nih_error!("Tape delay needs a main input bus");
            return false;
        };

        let config = EngineConfig {
            sample_rate: buffer_config.sample_rate,
            max_block_size: buffer_config.max_buffer_size as usize,
            num_channels: num_inputs as usize,
        };
        let Some(capacity) = self.engine.configure(config) else {
            nih_warn!(
                "Rejecting configuration with no usable delay store: {} Hz, {} channels",
                buffer_config.sample_rate,
                num_inputs
            );
            return false;
        };
        self.num_input_channels = config.num_channels;

        nih_log!(
            "Delay store allocated: {} channel(s) x {} samples at {} Hz (max block {})",
            self.engine.num_channels(),
            capacity,
            config.sample_rate,
            config.max_block_size
        );

        true
    }

    /// Transport stop or bypass: silence the tape so old echoes don't
    /// come back on the next play.
    fn reset(&mut self) {
        self.engine.reset();
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        let snapshot = self.params.snapshot();

        self.engine
            .process_block(buffer.as_slice(), self.num_input_channels, snapshot);

        tail_status(self.engine.delay_samples(snapshot.time_ms), snapshot.feedback)
    }
}

/// How long the host should keep calling `process()` after the input goes
/// silent.
///
/// Each repeat is scaled by `feedback`, so after N repeats the level is
/// `feedback^N`. Solving for -60 dB (`feedback^N = 0.001`) gives
/// `N = -3 / log10(feedback)` delay periods. At feedback 1.0 and above the
/// repeats never die away.
fn tail_status(delay_samples: usize, feedback: f32) -> ProcessStatus {
    if feedback >= 1.0 {
        return ProcessStatus::KeepAlive;
    }

    let delay_samples = delay_samples as f32;
    let tail_samples = if feedback > 0.001 {
        let repeats = -3.0 / feedback.log10();
        repeats * delay_samples
    } else {
        // No regeneration: just the one echo.
        delay_samples
    };

    ProcessStatus::Tail(tail_samples as u32)
}

impl ClapPlugin for TapeDelay {
    const CLAP_ID: &'static str = "com.loveless-audio.loveless-tape-delay";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("A tape-style delay with click-free delay time changes");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Mono,
        ClapFeature::Delay,
    ];
}

impl Vst3Plugin for TapeDelay {
    const VST3_CLASS_ID: [u8; 16] = *b"LvlssTapeDelay01";

    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Delay];
}

nih_export_clap!(TapeDelay);
nih_export_vst3!(TapeDelay);

// AUv2 entry point for Logic Pro, wrapping the CLAP export.
clap_wrapper::export_auv2!();
