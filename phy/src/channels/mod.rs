//! Physical downlink channels and signals
//!
//! A closed tagged-variant set (PDSCH, CORESET, PDCCH, SS/PBCH block,
//! standalone DMRS) behind one `PhysicalChannel` type. Every variant
//! pre-renders its complete per-slot data and tag arrays at construction
//! time, so the resource grid receives fully populated footprints and can
//! validate conflicts before writing a single element.

pub mod dmrs;
pub mod pdcch;
pub mod pdsch;
pub mod ssb;

pub use dmrs::DmrsConfig;
pub use pdcch::PdcchConfig;
pub use pdsch::PdschConfig;
pub use ssb::SsbConfig;

use crate::carrier::N_SC_PER_RB;
use common::types::Rnti;
use ndarray::Array2;
use num_complex::Complex32;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Channel/signal type tag carried by every resource element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelType {
    /// Unallocated
    Empty,
    /// Control resource set reservation
    Coreset,
    /// Physical downlink control channel
    Pdcch,
    /// Physical downlink shared channel
    Pdsch,
    /// Physical broadcast channel
    Pbch,
    /// Primary synchronization signal
    Pss,
    /// Secondary synchronization signal
    Sss,
    /// Demodulation reference signal
    Dmrs,
}

/// Variant-specific parameters of a physical channel
#[derive(Debug, Clone)]
pub enum ChannelKind {
    /// Shared channel with embedded DMRS symbols
    Pdsch {
        /// Payload modulation scheme
        modulation: common::types::ModulationScheme,
        /// DMRS symbol indices relative to the channel's first symbol
        dmrs_symbols: Vec<u8>,
    },
    /// Control resource set (zero-valued reservation)
    Coreset,
    /// Control channel filling a CORESET region
    Pdcch,
    /// SS/PBCH block (PSS + SSS + PBCH + PBCH DMRS)
    SsBlock {
        /// SSB index within the burst
        ssb_index: u8,
        /// Half-frame bit (0 or 1)
        half_frame: u8,
    },
    /// Standalone DMRS at arbitrary intra-RB positions
    Dmrs {
        /// RE positions within each resource block (0..12)
        positions: Vec<u8>,
    },
}

/// One slot's worth of rendered channel content
///
/// Both arrays are (channel subcarriers x channel symbols). Cells whose tag
/// is `Empty` are holes: the grid neither checks nor writes them, which is
/// how scattered (non-rectangular) reference signals allocate.
#[derive(Debug, Clone)]
pub struct RenderedSlot {
    /// Complex sample values
    pub values: Array2<Complex32>,
    /// Per-element channel-type tags
    pub tags: Array2<ChannelType>,
}

/// A physical channel placed on the grid
///
/// Frequency and time indices are always derived from the placement fields,
/// never stored separately.
#[derive(Debug, Clone)]
pub struct PhysicalChannel {
    kind: ChannelKind,
    start_rb: u16,
    num_rb: u16,
    start_symbol: u8,
    num_symbols: u8,
    slot_pattern: Vec<u16>,
    rnti: Option<Rnti>,
    rendered: Vec<RenderedSlot>,
}

impl PhysicalChannel {
    pub(crate) fn assemble(
        kind: ChannelKind,
        start_rb: u16,
        num_rb: u16,
        start_symbol: u8,
        num_symbols: u8,
        slot_pattern: Vec<u16>,
        rnti: Option<Rnti>,
        rendered: Vec<RenderedSlot>,
    ) -> Self {
        debug_assert_eq!(slot_pattern.len(), rendered.len());
        Self {
            kind,
            start_rb,
            num_rb,
            start_symbol,
            num_symbols,
            slot_pattern,
            rnti,
            rendered,
        }
    }

    /// The channel type used for occupancy bookkeeping and conflicts
    pub fn channel_type(&self) -> ChannelType {
        match self.kind {
            ChannelKind::Pdsch { .. } => ChannelType::Pdsch,
            ChannelKind::Coreset => ChannelType::Coreset,
            ChannelKind::Pdcch => ChannelType::Pdcch,
            ChannelKind::SsBlock { .. } => ChannelType::Pbch,
            ChannelKind::Dmrs { .. } => ChannelType::Dmrs,
        }
    }

    /// Variant-specific parameters
    pub fn kind(&self) -> &ChannelKind {
        &self.kind
    }

    /// Contiguous subcarrier range occupied by the channel
    pub fn frequency_footprint(&self) -> Range<usize> {
        let start = self.start_rb as usize * N_SC_PER_RB as usize;
        start..start + self.num_rb as usize * N_SC_PER_RB as usize
    }

    /// Frame-wide OFDM symbol range occupied in the given slot
    pub fn time_footprint(&self, slot: u16, symbols_per_slot: u8) -> Range<usize> {
        let start = slot as usize * symbols_per_slot as usize + self.start_symbol as usize;
        start..start + self.num_symbols as usize
    }

    /// Slots the channel repeats in
    pub fn slot_pattern(&self) -> &[u16] {
        &self.slot_pattern
    }

    /// Rendered content for slot_pattern()[idx]
    pub fn rendered(&self, idx: usize) -> &RenderedSlot {
        &self.rendered[idx]
    }

    /// Starting resource block
    pub fn start_rb(&self) -> u16 {
        self.start_rb
    }

    /// Number of resource blocks
    pub fn num_rb(&self) -> u16 {
        self.num_rb
    }

    /// First OFDM symbol within each slot
    pub fn start_symbol(&self) -> u8 {
        self.start_symbol
    }

    /// Number of OFDM symbols per slot occurrence
    pub fn num_symbols(&self) -> u8 {
        self.num_symbols
    }

    /// RNTI metadata (not consumed by symbol generation)
    pub fn rnti(&self) -> Option<Rnti> {
        self.rnti
    }
}

/// dB power offset to linear amplitude
pub(crate) fn db_to_amplitude(power_db: f32) -> f32 {
    10.0_f32.powf(power_db / 20.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::types::ModulationScheme;
    use common::types::Pci;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_footprints() {
        let mut rng = StdRng::seed_from_u64(1);
        let channel = PhysicalChannel::pdsch(
            PdschConfig {
                start_rb: 2,
                num_rb: 4,
                start_symbol: 1,
                num_symbols: 6,
                slot_pattern: vec![0, 3],
                modulation: ModulationScheme::Qpsk,
                dmrs_symbols: vec![1],
                power_db: 0.0,
                rnti: None,
            },
            Pci::new(1).unwrap(),
            &mut rng,
        )
        .unwrap();

        assert_eq!(channel.frequency_footprint(), 24..72);
        assert_eq!(channel.time_footprint(0, 14), 1..7);
        assert_eq!(channel.time_footprint(3, 14), 43..49);
        assert_eq!(channel.channel_type(), ChannelType::Pdsch);
        assert_eq!(channel.slot_pattern(), &[0, 3]);
    }

    #[test]
    fn test_db_to_amplitude() {
        assert!((db_to_amplitude(0.0) - 1.0).abs() < 1e-6);
        assert!((db_to_amplitude(6.0206) - 2.0).abs() < 1e-4);
        assert!((db_to_amplitude(-3.0103) - 1.0 / 2.0_f32.sqrt()).abs() < 1e-4);
    }
}
