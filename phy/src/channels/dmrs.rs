//! Standalone DMRS allocation
//!
//! A scattered reference-signal channel occupying configurable RE positions
//! within each resource block. Cells outside the configured positions are
//! rendered with the `Empty` tag and skipped by the grid, so the allocation
//! is genuinely non-rectangular.

use super::{db_to_amplitude, ChannelKind, ChannelType, PhysicalChannel, RenderedSlot};
use crate::carrier::N_SC_PER_RB;
use crate::dmrs::{generate_dmrs_sequence, pdsch_dmrs_cinit};
use crate::PhyError;
use common::types::Pci;
use ndarray::Array2;
use num_complex::Complex32;
use tracing::debug;

/// Standalone DMRS placement parameters
#[derive(Debug, Clone)]
pub struct DmrsConfig {
    /// RE positions within each resource block (0..12)
    pub positions: Vec<u8>,
    /// Starting resource block
    pub start_rb: u16,
    /// Number of resource blocks
    pub num_rb: u16,
    /// First OFDM symbol within each slot
    pub start_symbol: u8,
    /// Number of OFDM symbols
    pub num_symbols: u8,
    /// Slots the signal repeats in
    pub slot_pattern: Vec<u16>,
    /// Power offset in dB
    pub power_db: f32,
}

impl PhysicalChannel {
    /// Build a standalone DMRS allocation
    pub fn dmrs(config: DmrsConfig, cell_id: Pci) -> Result<Self, PhyError> {
        if config.positions.is_empty() {
            return Err(PhyError::Validation(
                "DMRS needs at least one RE position per resource block".into(),
            ));
        }
        if let Some(&p) = config.positions.iter().find(|&&p| p >= N_SC_PER_RB as u8) {
            return Err(PhyError::Validation(format!(
                "DMRS RE position {} outside resource block (0..12)",
                p
            )));
        }
        if config.num_rb == 0 || config.num_symbols == 0 || config.slot_pattern.is_empty() {
            return Err(PhyError::Validation(
                "DMRS allocation must span at least one RB, symbol and slot".into(),
            ));
        }

        let rendered = config
            .slot_pattern
            .iter()
            .map(|&slot| render_slot(&config, slot, cell_id))
            .collect();

        debug!(
            "DMRS: RBs {}..{}, positions {:?}, {} slot(s)",
            config.start_rb,
            config.start_rb + config.num_rb,
            config.positions,
            config.slot_pattern.len()
        );

        Ok(Self::assemble(
            ChannelKind::Dmrs {
                positions: config.positions.clone(),
            },
            config.start_rb,
            config.num_rb,
            config.start_symbol,
            config.num_symbols,
            config.slot_pattern,
            None,
            rendered,
        ))
    }
}

fn render_slot(config: &DmrsConfig, slot: u16, cell_id: Pci) -> RenderedSlot {
    let n_sc = config.num_rb as usize * N_SC_PER_RB as usize;
    let n_symbols = config.num_symbols as usize;
    let amplitude = db_to_amplitude(config.power_db);

    let mut values = Array2::from_elem((n_sc, n_symbols), Complex32::new(0.0, 0.0));
    let mut tags = Array2::from_elem((n_sc, n_symbols), ChannelType::Empty);

    for l in 0..config.num_symbols {
        let symbol_in_slot = config.start_symbol + l;
        let c_init = pdsch_dmrs_cinit(slot as u32, symbol_in_slot, cell_id.value());
        let sequence =
            generate_dmrs_sequence(c_init, config.num_rb as usize * config.positions.len());
        let mut m = 0;
        for rb in 0..config.num_rb as usize {
            for &position in &config.positions {
                let sc = rb * N_SC_PER_RB as usize + position as usize;
                values[[sc, l as usize]] = sequence[m] * amplitude;
                tags[[sc, l as usize]] = ChannelType::Dmrs;
                m += 1;
            }
        }
    }

    RenderedSlot { values, tags }
}
