//! SS/PBCH block allocation
//!
//! Maps the 20 RB x 4 symbol synchronization block of TS 38.211 Section
//! 7.4.3: PSS on symbol 0, SSS on symbol 2, PBCH payload on symbols 1-3
//! (side bands only on symbol 2) and PBCH DMRS at subcarriers v + 4k with
//! v = N_ID mod 4. The PBCH payload is random QPSK; transport-block coding
//! is out of scope.

use super::{db_to_amplitude, ChannelKind, ChannelType, PhysicalChannel, RenderedSlot};
use crate::dmrs::{generate_dmrs_sequence, pbch_dmrs_cinit};
use crate::modulation::random_symbol;
use crate::pss_sss::{generate_pss, generate_sss, SYNC_SEQ_LEN};
use crate::PhyError;
use common::types::{ModulationScheme, Pci};
use ndarray::Array2;
use num_complex::Complex32;
use rand::rngs::StdRng;
use tracing::debug;

/// SS/PBCH block width in resource blocks
pub const SSB_NUM_RB: u16 = 20;

/// SS/PBCH block span in OFDM symbols
pub const SSB_NUM_SYMBOLS: u8 = 4;

/// First subcarrier of the 127-element PSS/SSS within the block
const SYNC_START_SC: usize = 56;

/// Number of PBCH DMRS resource elements in one block
const PBCH_DMRS_LEN: usize = 144;

/// SS/PBCH block placement parameters
#[derive(Debug, Clone)]
pub struct SsbConfig {
    /// Starting resource block of the 20-RB block
    pub start_rb: u16,
    /// First OFDM symbol within each slot
    pub start_symbol: u8,
    /// Slots the block repeats in
    pub slot_pattern: Vec<u16>,
    /// SSB index within the burst
    pub ssb_index: u8,
    /// Half-frame bit (0 or 1)
    pub half_frame: u8,
    /// Power offset in dB
    pub power_db: f32,
}

impl PhysicalChannel {
    /// Build an SS/PBCH block allocation
    pub fn ss_block(config: SsbConfig, cell_id: Pci, rng: &mut StdRng) -> Result<Self, PhyError> {
        if config.half_frame > 1 {
            return Err(PhyError::Validation(format!(
                "Half-frame bit must be 0 or 1, got {}",
                config.half_frame
            )));
        }
        if config.slot_pattern.is_empty() {
            return Err(PhyError::Validation(
                "SS/PBCH block must be placed in at least one slot".into(),
            ));
        }

        let rendered = config
            .slot_pattern
            .iter()
            .map(|_| render_block(&config, cell_id, rng))
            .collect();

        debug!(
            "SSB: RBs {}..{}, symbols {}..{}, index {}, half-frame {}",
            config.start_rb,
            config.start_rb + SSB_NUM_RB,
            config.start_symbol,
            config.start_symbol + SSB_NUM_SYMBOLS,
            config.ssb_index,
            config.half_frame
        );

        Ok(Self::assemble(
            ChannelKind::SsBlock {
                ssb_index: config.ssb_index,
                half_frame: config.half_frame,
            },
            config.start_rb,
            SSB_NUM_RB,
            config.start_symbol,
            SSB_NUM_SYMBOLS,
            config.slot_pattern,
            None,
            rendered,
        ))
    }
}

fn render_block(config: &SsbConfig, cell_id: Pci, rng: &mut StdRng) -> RenderedSlot {
    let n_sc = SSB_NUM_RB as usize * 12;
    let amplitude = db_to_amplitude(config.power_db);
    let v = (cell_id.value() % 4) as usize;

    // Guard/filler elements stay zero but keep the block reserved
    let mut values = Array2::from_elem((n_sc, 4), Complex32::new(0.0, 0.0));
    let mut tags = Array2::from_elem((n_sc, 4), ChannelType::Pbch);

    // Symbol 0: PSS
    for (n, &d) in generate_pss(cell_id.value()).iter().enumerate() {
        values[[SYNC_START_SC + n, 0]] = d * amplitude;
        tags[[SYNC_START_SC + n, 0]] = ChannelType::Pss;
    }

    // Symbol 2: SSS
    for (n, &d) in generate_sss(cell_id.value()).iter().enumerate() {
        values[[SYNC_START_SC + n, 2]] = d * amplitude;
        tags[[SYNC_START_SC + n, 2]] = ChannelType::Sss;
    }
    debug_assert_eq!(SYNC_START_SC + SYNC_SEQ_LEN, 183);

    // PBCH payload + DMRS. The single 144-element DMRS sequence is consumed
    // in mapping order: symbol 1 (60 REs), symbol 2 side bands (24), symbol
    // 3 (60).
    let c_init = pbch_dmrs_cinit(cell_id.value(), config.ssb_index, config.half_frame);
    let dmrs = generate_dmrs_sequence(c_init, PBCH_DMRS_LEN);
    let mut m = 0;
    for symbol in [1usize, 2, 3] {
        for sc in 0..n_sc {
            // Symbol 2 carries PBCH only in the side bands around the SSS
            if symbol == 2 && (48..192).contains(&sc) {
                continue;
            }
            if sc % 4 == v {
                values[[sc, symbol]] = dmrs[m] * amplitude;
                tags[[sc, symbol]] = ChannelType::Dmrs;
                m += 1;
            } else {
                values[[sc, symbol]] = random_symbol(ModulationScheme::Qpsk, rng) * amplitude;
                tags[[sc, symbol]] = ChannelType::Pbch;
            }
        }
    }
    debug_assert_eq!(m, PBCH_DMRS_LEN);

    RenderedSlot { values, tags }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn build(cell_id: u16) -> PhysicalChannel {
        let mut rng = StdRng::seed_from_u64(5);
        PhysicalChannel::ss_block(
            SsbConfig {
                start_rb: 0,
                start_symbol: 2,
                slot_pattern: vec![0],
                ssb_index: 0,
                half_frame: 0,
                power_db: 0.0,
            },
            Pci::new(cell_id).unwrap(),
            &mut rng,
        )
        .unwrap()
    }

    #[test]
    fn test_block_dimensions() {
        let ssb = build(0);
        assert_eq!(ssb.num_rb(), 20);
        assert_eq!(ssb.num_symbols(), 4);
        assert_eq!(ssb.rendered(0).values.dim(), (240, 4));
        assert_eq!(ssb.channel_type(), ChannelType::Pbch);
    }

    #[test]
    fn test_pss_sss_placement() {
        let ssb = build(3);
        let slot = ssb.rendered(0);
        assert_eq!(slot.tags[[56, 0]], ChannelType::Pss);
        assert_eq!(slot.tags[[182, 0]], ChannelType::Pss);
        assert_eq!(slot.tags[[55, 0]], ChannelType::Pbch);
        assert_eq!(slot.values[[55, 0]], Complex32::new(0.0, 0.0));
        assert_eq!(slot.tags[[56, 2]], ChannelType::Sss);
        assert_eq!(slot.tags[[182, 2]], ChannelType::Sss);
    }

    #[test]
    fn test_pbch_dmrs_positions_follow_cell_id() {
        // v = cell_id mod 4
        let ssb = build(6);
        let slot = ssb.rendered(0);
        for sc in 0..240usize {
            let expected = if sc % 4 == 2 { ChannelType::Dmrs } else { ChannelType::Pbch };
            assert_eq!(slot.tags[[sc, 1]], expected, "sc {}", sc);
        }
    }

    #[test]
    fn test_symbol2_side_bands_only() {
        let ssb = build(0);
        let slot = ssb.rendered(0);
        // Inside the SSS span no PBCH/DMRS is mapped
        for sc in 48..56 {
            assert_eq!(slot.tags[[sc, 2]], ChannelType::Pbch);
            assert_eq!(slot.values[[sc, 2]], Complex32::new(0.0, 0.0));
        }
        // Side bands carry DMRS at v=0 positions
        assert_eq!(slot.tags[[0, 2]], ChannelType::Dmrs);
        assert_eq!(slot.tags[[192, 2]], ChannelType::Dmrs);
    }

    #[test]
    fn test_dmrs_sequence_continuity() {
        // The 144-symbol sequence spans symbols 1, 2, 3 in order
        let ssb = build(0);
        let slot = ssb.rendered(0);
        let dmrs = generate_dmrs_sequence(pbch_dmrs_cinit(0, 0, 0), 144);
        assert_eq!(slot.values[[0, 1]], dmrs[0]);
        assert_eq!(slot.values[[4, 1]], dmrs[1]);
        // First side-band DMRS of symbol 2 continues at index 60
        assert_eq!(slot.values[[0, 2]], dmrs[60]);
        // Symbol 3 resumes at index 84
        assert_eq!(slot.values[[0, 3]], dmrs[84]);
    }

    #[test]
    fn test_invalid_half_frame() {
        let mut rng = StdRng::seed_from_u64(0);
        let result = PhysicalChannel::ss_block(
            SsbConfig {
                start_rb: 0,
                start_symbol: 0,
                slot_pattern: vec![0],
                ssb_index: 0,
                half_frame: 2,
                power_db: 0.0,
            },
            Pci::new(0).unwrap(),
            &mut rng,
        );
        assert!(matches!(result, Err(PhyError::Validation(_))));
    }
}
