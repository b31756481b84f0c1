//! Common Types Library
//!
//! Shared plain types used across the NR waveform-synthesis workspace.

pub mod types;

// Re-export commonly used items
pub use types::*;
