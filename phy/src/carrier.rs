//! Carrier and Numerology Model for 5G NR
//!
//! Maps numerology index and channel bandwidth to subcarrier spacing,
//! resource-block count and slot structure according to 3GPP TS 38.211
//! and the transmission-bandwidth tables of TS 38.101.

use crate::PhyError;
use common::types::{Bandwidth, Pci, SubcarrierSpacing};
use std::str::FromStr;
use tracing::debug;

/// Number of subcarriers per resource block
pub const N_SC_PER_RB: u16 = 12;

/// Number of subframes per 10 ms frame
pub const N_SUBFRAMES_PER_FRAME: u16 = 10;

/// Cyclic prefix type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclicPrefix {
    /// Normal CP, 14 symbols per slot
    Normal,
    /// Extended CP, 12 symbols per slot (60 kHz SCS only)
    Extended,
}

impl FromStr for CyclicPrefix {
    type Err = PhyError;

    fn from_str(s: &str) -> Result<Self, PhyError> {
        match s {
            "normal" => Ok(CyclicPrefix::Normal),
            "extended" => Ok(CyclicPrefix::Extended),
            other => Err(PhyError::Validation(format!(
                "Cyclic prefix must be 'normal' or 'extended', got '{}'",
                other
            ))),
        }
    }
}

/// Numerology configuration derived from the index mu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Numerology {
    /// Numerology index (0..=4)
    pub mu: u8,
    /// Subcarrier spacing (15 * 2^mu kHz)
    pub subcarrier_spacing: SubcarrierSpacing,
    /// Number of slots per 1 ms subframe (2^mu)
    pub slots_per_subframe: u16,
    /// OFDM symbols per slot (14 normal CP, 12 extended CP)
    pub symbols_per_slot: u8,
}

impl Numerology {
    /// Create a numerology from the index mu and CP type
    pub fn new(mu: u8, cyclic_prefix: CyclicPrefix) -> Result<Self, PhyError> {
        let subcarrier_spacing = SubcarrierSpacing::from_mu(mu)
            .ok_or_else(|| PhyError::Validation(format!("Numerology mu={} out of range 0..=4", mu)))?;

        // Extended CP is defined only for 60 kHz SCS (TS 38.211 Table 4.2-1)
        let symbols_per_slot = match cyclic_prefix {
            CyclicPrefix::Normal => 14,
            CyclicPrefix::Extended => {
                if mu != 2 {
                    return Err(PhyError::Configuration(format!(
                        "Extended cyclic prefix requires mu=2 (60 kHz), got mu={}",
                        mu
                    )));
                }
                12
            }
        };

        Ok(Self {
            mu,
            subcarrier_spacing,
            slots_per_subframe: 1 << mu,
            symbols_per_slot,
        })
    }

    /// Slot duration in seconds (1 ms / 2^mu)
    pub fn slot_duration_s(&self) -> f64 {
        1e-3 / self.slots_per_subframe as f64
    }
}

/// 5G NR carrier configuration
///
/// Owns no mutable state after construction; the resource grid and the
/// OFDM parameters are derived from it, never stored in it.
#[derive(Debug, Clone)]
pub struct CarrierConfig {
    /// Numerology configuration
    pub numerology: Numerology,
    /// Number of resource blocks in the carrier grid
    pub n_resource_blocks: u16,
    /// Cyclic prefix type
    pub cyclic_prefix: CyclicPrefix,
    /// Physical cell identity (0..=1007)
    pub cell_id: Pci,
    /// Output sample rate in Hz
    pub sample_rate: f64,
    /// Custom FFT size override, must be >= the useful sample count
    pub fft_size: Option<usize>,
}

impl CarrierConfig {
    /// Create a carrier from a standardized (bandwidth, mu) combination
    pub fn from_bandwidth(
        bandwidth: Bandwidth,
        mu: u8,
        cell_id: u16,
    ) -> Result<Self, PhyError> {
        let numerology = Numerology::new(mu, CyclicPrefix::Normal)?;
        let n_resource_blocks = rb_count(bandwidth, mu)?;
        let cell_id = Pci::new(cell_id)
            .ok_or_else(|| PhyError::Validation(format!("Cell ID {} out of range 0..=1007", cell_id)))?;

        let mut config = Self {
            numerology,
            n_resource_blocks,
            cyclic_prefix: CyclicPrefix::Normal,
            cell_id,
            sample_rate: 0.0,
            fft_size: None,
        };
        config.sample_rate = config.standard_sample_rate();

        debug!(
            "Carrier: {} MHz mu={} -> {} RBs, {} subcarriers, fs={} Hz",
            bandwidth.as_mhz(),
            mu,
            config.n_resource_blocks,
            config.n_subcarriers(),
            config.sample_rate
        );
        Ok(config)
    }

    /// Switch to extended cyclic prefix (mu=2 only)
    pub fn with_cyclic_prefix(mut self, cp: CyclicPrefix) -> Result<Self, PhyError> {
        self.numerology = Numerology::new(self.numerology.mu, cp)?;
        self.cyclic_prefix = cp;
        Ok(self)
    }

    /// Override the output sample rate
    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Override the FFT size used for synthesis
    pub fn with_fft_size(mut self, fft_size: usize) -> Self {
        self.fft_size = Some(fft_size);
        self
    }

    /// Total number of subcarriers in the grid
    pub fn n_subcarriers(&self) -> usize {
        self.n_resource_blocks as usize * N_SC_PER_RB as usize
    }

    /// Total number of slots in one 10 ms frame
    pub fn total_slots(&self) -> u16 {
        N_SUBFRAMES_PER_FRAME * self.numerology.slots_per_subframe
    }

    /// Total number of OFDM symbols in one frame
    pub fn total_symbols(&self) -> usize {
        self.total_slots() as usize * self.numerology.symbols_per_slot as usize
    }

    /// Smallest power-of-two FFT covering the occupied subcarriers
    pub fn standard_fft_size(&self) -> usize {
        self.n_subcarriers().next_power_of_two()
    }

    /// Standard sample rate implied by subcarrier spacing and FFT size
    pub fn standard_sample_rate(&self) -> f64 {
        self.standard_fft_size() as f64 * self.numerology.subcarrier_spacing.as_hz()
    }
}

/// Resolve the transmission-bandwidth configuration N_RB for a
/// (bandwidth, numerology) pair per TS 38.101 Table 5.3.2-1
pub fn rb_count(bandwidth: Bandwidth, mu: u8) -> Result<u16, PhyError> {
    let n_rb = match (bandwidth.as_mhz(), mu) {
        // FR1
        (5, 0) => 25,
        (5, 1) => 11,
        (10, 0) => 52,
        (10, 1) => 24,
        (10, 2) => 11,
        (15, 0) => 79,
        (15, 1) => 38,
        (15, 2) => 18,
        (20, 0) => 106,
        (20, 1) => 51,
        (20, 2) => 24,
        (25, 0) => 133,
        (25, 1) => 65,
        (25, 2) => 31,
        (30, 0) => 160,
        (30, 1) => 78,
        (30, 2) => 38,
        (40, 0) => 216,
        (40, 1) => 106,
        (40, 2) => 51,
        (50, 0) => 270,
        (50, 1) => 133,
        (50, 2) => 65,
        (60, 0) => 324,
        (60, 1) => 162,
        (60, 2) => 79,
        (70, 0) => 378,
        (70, 1) => 189,
        (70, 2) => 93,
        (80, 0) => 432,
        (80, 1) => 217,
        (80, 2) => 107,
        (90, 0) => 486,
        (90, 1) => 245,
        (90, 2) => 121,
        (100, 0) => 540,
        (100, 1) => 273,
        (100, 2) => 135,
        // FR2-1
        (50, 3) => 32,
        (100, 3) => 66,
        (200, 2) => 264,
        (200, 3) => 132,
        (400, 2) => 528,
        (400, 3) => 264,
        // FR2-2
        (400, 4) => 132,
        (800, 3) => 528,
        (800, 4) => 264,
        (1600, 3) => 1056,
        (1600, 4) => 528,
        (2000, 3) => 1320,
        (2000, 4) => 660,
        (bw, mu) => {
            return Err(PhyError::Configuration(format!(
                "Invalid combination of bandwidth ({} MHz) and numerology (mu={})",
                bw, mu
            )))
        }
    };
    Ok(n_rb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rb_table_valid_pairs() {
        assert_eq!(rb_count(Bandwidth::Bw5, 0).unwrap(), 25);
        assert_eq!(rb_count(Bandwidth::Bw5, 1).unwrap(), 11);
        assert_eq!(rb_count(Bandwidth::Bw20, 0).unwrap(), 106);
        assert_eq!(rb_count(Bandwidth::Bw20, 1).unwrap(), 51);
        assert_eq!(rb_count(Bandwidth::Bw100, 1).unwrap(), 273);
        assert_eq!(rb_count(Bandwidth::Bw400, 3).unwrap(), 264);
    }

    #[test]
    fn test_rb_table_invalid_pairs() {
        assert!(matches!(
            rb_count(Bandwidth::Bw5, 2),
            Err(PhyError::Configuration(_))
        ));
        assert!(matches!(
            rb_count(Bandwidth::Bw2000, 0),
            Err(PhyError::Configuration(_))
        ));
    }

    #[test]
    fn test_numerology() {
        let num = Numerology::new(1, CyclicPrefix::Normal).unwrap();
        assert_eq!(num.subcarrier_spacing, SubcarrierSpacing::Scs30);
        assert_eq!(num.slots_per_subframe, 2);
        assert_eq!(num.symbols_per_slot, 14);
        assert_eq!(num.slot_duration_s(), 0.5e-3);

        assert!(Numerology::new(5, CyclicPrefix::Normal).is_err());
    }

    #[test]
    fn test_extended_cp_requires_mu2() {
        assert!(Numerology::new(2, CyclicPrefix::Extended).is_ok());
        assert!(matches!(
            Numerology::new(1, CyclicPrefix::Extended),
            Err(PhyError::Configuration(_))
        ));
    }

    #[test]
    fn test_cell_id_range() {
        assert!(CarrierConfig::from_bandwidth(Bandwidth::Bw20, 0, 1007).is_ok());
        assert!(matches!(
            CarrierConfig::from_bandwidth(Bandwidth::Bw20, 0, 1008),
            Err(PhyError::Validation(_))
        ));
    }

    #[test]
    fn test_standard_sample_rate() {
        // 106 RB -> 1272 subcarriers -> 2048 FFT -> 30.72 MHz at 15 kHz
        let config = CarrierConfig::from_bandwidth(Bandwidth::Bw20, 0, 0).unwrap();
        assert_eq!(config.standard_fft_size(), 2048);
        assert_eq!(config.standard_sample_rate(), 30_720_000.0);
        assert_eq!(config.total_slots(), 10);
        assert_eq!(config.total_symbols(), 140);
    }

    #[test]
    fn test_cp_parse() {
        assert_eq!("normal".parse::<CyclicPrefix>().unwrap(), CyclicPrefix::Normal);
        assert_eq!("extended".parse::<CyclicPrefix>().unwrap(), CyclicPrefix::Extended);
        assert!("cyclic".parse::<CyclicPrefix>().is_err());
    }
}
