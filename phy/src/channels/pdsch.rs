//! Physical Downlink Shared Channel allocation
//!
//! PDSCH carries random payload symbols of the configured modulation with
//! type-1 DMRS interleaved on the even subcarriers of the designated DMRS
//! symbols. DMRS always overwrites previously generated payload at its
//! reserved positions, and the overwritten cells keep the DMRS tag so grid
//! reads can separate reference from payload within the same allocation.

use super::{db_to_amplitude, ChannelKind, ChannelType, PhysicalChannel, RenderedSlot};
use crate::carrier::N_SC_PER_RB;
use crate::dmrs::{generate_dmrs_sequence, pdsch_dmrs_cinit};
use crate::modulation::random_symbols;
use crate::PhyError;
use common::types::{ModulationScheme, Pci, Rnti};
use ndarray::Array2;
use rand::rngs::StdRng;
use tracing::debug;

/// PDSCH placement and generation parameters
#[derive(Debug, Clone)]
pub struct PdschConfig {
    /// Starting resource block
    pub start_rb: u16,
    /// Number of resource blocks
    pub num_rb: u16,
    /// First OFDM symbol within each slot
    pub start_symbol: u8,
    /// Number of OFDM symbols
    pub num_symbols: u8,
    /// Slots the allocation repeats in
    pub slot_pattern: Vec<u16>,
    /// Payload modulation scheme
    pub modulation: ModulationScheme,
    /// DMRS symbol indices relative to `start_symbol`
    pub dmrs_symbols: Vec<u8>,
    /// Power offset in dB
    pub power_db: f32,
    /// RNTI metadata
    pub rnti: Option<Rnti>,
}

impl PhysicalChannel {
    /// Build a PDSCH allocation with pre-rendered per-slot content
    pub fn pdsch(config: PdschConfig, cell_id: Pci, rng: &mut StdRng) -> Result<Self, PhyError> {
        if config.num_rb == 0 || config.num_symbols == 0 || config.slot_pattern.is_empty() {
            return Err(PhyError::Validation(
                "PDSCH allocation must span at least one RB, symbol and slot".into(),
            ));
        }
        if let Some(&l) = config.dmrs_symbols.iter().find(|&&l| l >= config.num_symbols) {
            return Err(PhyError::Validation(format!(
                "PDSCH DMRS symbol {} outside allocation of {} symbols",
                l, config.num_symbols
            )));
        }

        let rendered = config
            .slot_pattern
            .iter()
            .map(|&slot| render_slot(&config, slot, cell_id, rng))
            .collect();

        debug!(
            "PDSCH: RBs {}..{}, symbols {}..{}, {} slot(s), {:?}",
            config.start_rb,
            config.start_rb + config.num_rb,
            config.start_symbol,
            config.start_symbol + config.num_symbols,
            config.slot_pattern.len(),
            config.modulation
        );

        Ok(Self::assemble(
            ChannelKind::Pdsch {
                modulation: config.modulation,
                dmrs_symbols: config.dmrs_symbols.clone(),
            },
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

fn render_slot(config: &PdschConfig, slot: u16, cell_id: Pci, rng: &mut StdRng) -> RenderedSlot {
    let n_sc = config.num_rb as usize * N_SC_PER_RB as usize;
    let n_symbols = config.num_symbols as usize;
    let amplitude = db_to_amplitude(config.power_db);

    // Payload first over the full footprint
    let mut values = random_symbols(n_sc, n_symbols, config.modulation, rng);
    values.mapv_inplace(|v| v * amplitude);
    let mut tags = Array2::from_elem((n_sc, n_symbols), ChannelType::Pdsch);

    // DMRS overwrites the even subcarriers of its symbols (type 1, 6 REs/RB)
    for &l in &config.dmrs_symbols {
        let symbol_in_slot = config.start_symbol + l;
        let c_init = pdsch_dmrs_cinit(slot as u32, symbol_in_slot, cell_id.value());
        let sequence = generate_dmrs_sequence(c_init, config.num_rb as usize * 6);
        for (m, &r) in sequence.iter().enumerate() {
            let sc = 2 * m;
            values[[sc, l as usize]] = r * amplitude;
            tags[[sc, l as usize]] = ChannelType::Dmrs;
        }
    }

    RenderedSlot { values, tags }
}
