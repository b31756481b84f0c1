//! Frame-wide resource grid for 5G NR downlink synthesis
//!
//! Holds one 10 ms frame of resource elements as dense (subcarrier x
//! symbol) arrays, one for complex values and one for channel-type
//! bookkeeping. Allocation is all-or-nothing: the complete footprint of a
//! channel is conflict-checked across every slot of its pattern before any
//! element is written, so a failed `add_channel` leaves the grid untouched.

use crate::carrier::CarrierConfig;
use crate::channels::{ChannelType, PhysicalChannel};
use crate::PhyError;
use ndarray::{Array2, ArrayView1};
use num_complex::Complex32;
use tracing::debug;

/// The 2D resource-element container for one frame
#[derive(Debug, Clone)]
pub struct ResourceGrid {
    /// Complex sample per RE, (n_subcarriers, total_symbols)
    values: Array2<Complex32>,
    /// Channel-type tag per RE
    channel_types: Array2<ChannelType>,
    num_rb: u16,
    symbols_per_slot: u8,
    total_slots: u16,
}

impl ResourceGrid {
    /// Create an empty grid sized for the carrier's frame
    pub fn new(carrier: &CarrierConfig) -> Self {
        let n_sc = carrier.n_subcarriers();
        let n_symbols = carrier.total_symbols();
        debug!("Resource grid: {} subcarriers x {} symbols", n_sc, n_symbols);

        Self {
            values: Array2::from_elem((n_sc, n_symbols), Complex32::new(0.0, 0.0)),
            channel_types: Array2::from_elem((n_sc, n_symbols), ChannelType::Empty),
            num_rb: carrier.n_resource_blocks,
            symbols_per_slot: carrier.numerology.symbols_per_slot,
            total_slots: carrier.total_slots(),
        }
    }

    /// Allocate a channel onto the grid
    ///
    /// An element accepts a new channel only if it is EMPTY, or if the
    /// incoming channel is a PDCCH filling an existing CORESET reservation.
    /// Any other collision fails with `ResourceConflict` and the grid is
    /// left unmodified.
    pub fn add_channel(&mut self, channel: &PhysicalChannel) -> Result<(), PhyError> {
        let freq = channel.frequency_footprint();
        if freq.end > self.n_subcarriers() {
            return Err(PhyError::Configuration(format!(
                "Channel RBs {}..{} exceed grid of {} RBs",
                channel.start_rb(),
                channel.start_rb() + channel.num_rb(),
                self.num_rb
            )));
        }
        if channel.start_symbol() + channel.num_symbols() > self.symbols_per_slot {
            return Err(PhyError::Configuration(format!(
                "Channel symbols {}..{} exceed the {}-symbol slot",
                channel.start_symbol(),
                channel.start_symbol() + channel.num_symbols(),
                self.symbols_per_slot
            )));
        }

        let incoming = channel.channel_type();

        // Validate the entire footprint first; writes happen only after
        // every targeted element has been cleared.
        for (idx, &slot) in channel.slot_pattern().iter().enumerate() {
            if slot >= self.total_slots {
                return Err(PhyError::Configuration(format!(
                    "Slot {} outside frame of {} slots",
                    slot, self.total_slots
                )));
            }
            let rendered = channel.rendered(idx);
            for (t, symbol) in channel.time_footprint(slot, self.symbols_per_slot).enumerate() {
                for (f, sc) in freq.clone().enumerate() {
                    if rendered.tags[[f, t]] == ChannelType::Empty {
                        continue;
                    }
                    let occupant = self.channel_types[[sc, symbol]];
                    let allowed = occupant == ChannelType::Empty
                        || (incoming == ChannelType::Pdcch && occupant == ChannelType::Coreset);
                    if !allowed {
                        return Err(PhyError::ResourceConflict {
                            channel: incoming,
                            occupant,
                            rb: (sc / 12) as u16,
                            symbol,
                        });
                    }
                }
            }
        }

        for (idx, &slot) in channel.slot_pattern().iter().enumerate() {
            let rendered = channel.rendered(idx);
            for (t, symbol) in channel.time_footprint(slot, self.symbols_per_slot).enumerate() {
                for (f, sc) in freq.clone().enumerate() {
                    if rendered.tags[[f, t]] == ChannelType::Empty {
                        continue;
                    }
                    self.values[[sc, symbol]] = rendered.values[[f, t]];
                    self.channel_types[[sc, symbol]] = rendered.tags[[f, t]];
                }
            }
        }

        debug!(
            "Allocated {:?}: RBs {}..{}, {} slot(s)",
            incoming,
            channel.start_rb(),
            channel.start_rb() + channel.num_rb(),
            channel.slot_pattern().len()
        );
        Ok(())
    }

    /// Full 2D projection of the complex values (pure read)
    pub fn values(&self) -> &Array2<Complex32> {
        &self.values
    }

    /// Full 2D projection of the channel-type tags (pure read)
    pub fn channel_types(&self) -> &Array2<ChannelType> {
        &self.channel_types
    }

    /// One frequency-domain column for OFDM synthesis
    pub fn symbol_view(&self, symbol: usize) -> ArrayView1<'_, Complex32> {
        self.values.column(symbol)
    }

    /// Number of subcarriers
    pub fn n_subcarriers(&self) -> usize {
        self.values.nrows()
    }

    /// Total OFDM symbols in the frame
    pub fn total_symbols(&self) -> usize {
        self.values.ncols()
    }

    /// OFDM symbols per slot
    pub fn symbols_per_slot(&self) -> u8 {
        self.symbols_per_slot
    }

    /// Slots per frame
    pub fn total_slots(&self) -> u16 {
        self.total_slots
    }

    /// Number of resource blocks
    pub fn num_rb(&self) -> u16 {
        self.num_rb
    }
}
