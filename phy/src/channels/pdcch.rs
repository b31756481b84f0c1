//! CORESET and Physical Downlink Control Channel allocation
//!
//! A CORESET reserves its time/frequency region with zero-valued elements;
//! the PDCCH subsequently fills the region with QPSK payload and DMRS at
//! intra-RB offsets {1, 5, 9}. The resource grid allow-lists exactly this
//! PDCCH-over-CORESET overlay.

use super::{db_to_amplitude, ChannelKind, ChannelType, PhysicalChannel, RenderedSlot};
use crate::carrier::N_SC_PER_RB;
use crate::dmrs::{generate_dmrs_sequence, pdcch_dmrs_cinit};
use crate::modulation::random_symbols;
use crate::PhyError;
use common::types::{ModulationScheme, Pci, Rnti};
use ndarray::Array2;
use num_complex::Complex32;
use rand::rngs::StdRng;
use tracing::debug;

/// DMRS RE positions within each resource block of a PDCCH
const PDCCH_DMRS_OFFSETS: [usize; 3] = [1, 5, 9];

/// CORESET/PDCCH placement parameters (both use the same footprint)
#[derive(Debug, Clone)]
pub struct PdcchConfig {
    /// Starting resource block
    pub start_rb: u16,
    /// Number of resource blocks
    pub num_rb: u16,
    /// First OFDM symbol within each slot
    pub start_symbol: u8,
    /// Number of OFDM symbols (1..=3 for a CORESET)
    pub num_symbols: u8,
    /// Slots the allocation repeats in
    pub slot_pattern: Vec<u16>,
    /// Power offset in dB
    pub power_db: f32,
    /// RNTI metadata
    pub rnti: Option<Rnti>,
}

impl PdcchConfig {
    fn validate(&self) -> Result<(), PhyError> {
        if self.num_rb == 0 || self.num_symbols == 0 || self.slot_pattern.is_empty() {
            return Err(PhyError::Validation(
                "CORESET/PDCCH allocation must span at least one RB, symbol and slot".into(),
            ));
        }
        Ok(())
    }
}

impl PhysicalChannel {
    /// Build a CORESET reservation (zero-valued, tag only)
    pub fn coreset(config: PdcchConfig) -> Result<Self, PhyError> {
        config.validate()?;

        let n_sc = config.num_rb as usize * N_SC_PER_RB as usize;
        let shape = (n_sc, config.num_symbols as usize);
        let rendered = config
            .slot_pattern
            .iter()
            .map(|_| RenderedSlot {
                values: Array2::from_elem(shape, Complex32::new(0.0, 0.0)),
                tags: Array2::from_elem(shape, ChannelType::Coreset),
            })
            .collect();

        debug!(
            "CORESET: RBs {}..{}, symbols {}..{}, {} slot(s)",
            config.start_rb,
            config.start_rb + config.num_rb,
            config.start_symbol,
            config.start_symbol + config.num_symbols,
            config.slot_pattern.len()
        );

        Ok(Self::assemble(
            ChannelKind::Coreset,
            config.start_rb,
            config.num_rb,
            config.start_symbol,
            config.num_symbols,
            config.slot_pattern,
            config.rnti,
            rendered,
        ))
    }

    /// Build a PDCCH filling the same footprint as its CORESET
    pub fn pdcch(config: PdcchConfig, cell_id: Pci, rng: &mut StdRng) -> Result<Self, PhyError> {
        config.validate()?;

        let rendered = config
            .slot_pattern
            .iter()
            .map(|&slot| render_slot(&config, slot, cell_id, rng))
            .collect();

        debug!(
            "PDCCH: RBs {}..{}, symbols {}..{}, {} slot(s)",
            config.start_rb,
            config.start_rb + config.num_rb,
            config.start_symbol,
            config.start_symbol + config.num_symbols,
            config.slot_pattern.len()
        );

        Ok(Self::assemble(
            ChannelKind::Pdcch,
            config.start_rb,
            config.num_rb,
            config.start_symbol,
            config.num_symbols,
            config.slot_pattern,
            config.rnti,
            rendered,
        ))
    }
}

fn render_slot(config: &PdcchConfig, slot: u16, cell_id: Pci, rng: &mut StdRng) -> RenderedSlot {
    let n_sc = config.num_rb as usize * N_SC_PER_RB as usize;
    let n_symbols = config.num_symbols as usize;
    let amplitude = db_to_amplitude(config.power_db);

    // QPSK payload over the whole footprint, DMRS overwrites its offsets
    let mut values = random_symbols(n_sc, n_symbols, ModulationScheme::Qpsk, rng);
    values.mapv_inplace(|v| v * amplitude);
    let mut tags = Array2::from_elem((n_sc, n_symbols), ChannelType::Pdcch);

    for l in 0..config.num_symbols {
        let symbol_in_slot = config.start_symbol + l;
        let c_init = pdcch_dmrs_cinit(slot as u32, symbol_in_slot, cell_id.value());
        let sequence =
            generate_dmrs_sequence(c_init, config.num_rb as usize * PDCCH_DMRS_OFFSETS.len());
        let mut m = 0;
        for rb in 0..config.num_rb as usize {
            for &offset in &PDCCH_DMRS_OFFSETS {
                let sc = rb * N_SC_PER_RB as usize + offset;
                values[[sc, l as usize]] = sequence[m] * amplitude;
                tags[[sc, l as usize]] = ChannelType::Dmrs;
                m += 1;
            }
        }
    }

    RenderedSlot { values, tags }
}
