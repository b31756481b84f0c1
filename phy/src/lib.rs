//! 5G NR Downlink Waveform Synthesis
//!
//! Builds standards-compliant downlink baseband waveforms for simulation and
//! test: a frame-wide time-frequency resource grid with conflict-checked
//! channel allocation, Gold-sequence reference signals, 3GPP constellation
//! mapping and per-symbol OFDM synthesis per TS 38.211.

pub mod builder;
pub mod carrier;
pub mod channels;
pub mod dmrs;
pub mod gold;
pub mod modulation;
pub mod ofdm;
pub mod pss_sss;
pub mod resampler;
pub mod resource_grid;
pub mod waveform;

// Re-export commonly used types
pub use builder::SignalBuilder;
pub use carrier::{CarrierConfig, CyclicPrefix, Numerology};
pub use channels::{ChannelType, PhysicalChannel};
pub use gold::GoldSequence;
pub use ofdm::{calculate_ofdm_params, OfdmModulator, OfdmParams};
pub use resource_grid::ResourceGrid;
pub use waveform::{WaveformGenerator, WaveformParameters};

use thiserror::Error;

/// Errors raised by the waveform-synthesis core
#[derive(Error, Debug)]
pub enum PhyError {
    /// Invalid bandwidth/numerology pair, non-integer useful-sample count,
    /// CP type mismatched with numerology, undersized custom FFT, ...
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Parameter outside its legal domain (cell id, CP string, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// A targeted resource element is already occupied by an incompatible
    /// channel. The grid is left unmodified when this is raised.
    #[error("Resource conflict: {channel:?} collides with {occupant:?} at RB {rb}, symbol {symbol}")]
    ResourceConflict {
        /// Channel type that failed to allocate
        channel: ChannelType,
        /// Channel type already occupying the element
        occupant: ChannelType,
        /// Resource block index of the collision
        rb: u16,
        /// Frame-wide OFDM symbol index of the collision
        symbol: usize,
    },
}
