//! High-level signal construction
//!
//! `SignalBuilder` strings the pieces together: carrier setup, channel
//! allocation onto the grid, and frame synthesis. One `StdRng` is owned by
//! the builder and threaded through every payload generator, so a seeded
//! builder produces bit-identical waveforms run to run.

use crate::carrier::CarrierConfig;
use crate::channels::{DmrsConfig, PdcchConfig, PdschConfig, PhysicalChannel, SsbConfig};
use crate::resource_grid::ResourceGrid;
use crate::waveform::{WaveformGenerator, WaveformParameters};
use crate::PhyError;
use common::types::Bandwidth;
use num_complex::Complex32;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

#[derive(Debug)]
pub struct SignalBuilder {
    carrier: CarrierConfig,
    grid: ResourceGrid,
    rng: StdRng,
}

impl SignalBuilder {
    /// Builder for a carrier at the standard sample rate, OS-seeded payloads
    pub fn new(bandwidth: Bandwidth, mu: u8, cell_id: u16) -> Result<Self, PhyError> {
        let carrier = CarrierConfig::from_bandwidth(bandwidth, mu, cell_id)?;
        info!(
            "Signal builder: {} RBs, mu={}, cell {}",
            carrier.n_resource_blocks, mu, cell_id
        );
        let grid = ResourceGrid::new(&carrier);
        Ok(Self {
            carrier,
            grid,
            rng: StdRng::from_entropy(),
        })
    }

    /// Same as `new` but with deterministic payload generation
    pub fn with_seed(
        bandwidth: Bandwidth,
        mu: u8,
        cell_id: u16,
        seed: u64,
    ) -> Result<Self, PhyError> {
        let mut builder = Self::new(bandwidth, mu, cell_id)?;
        builder.rng = StdRng::seed_from_u64(seed);
        Ok(builder)
    }

    /// Override the output sample rate (defaults to the standard rate)
    pub fn sample_rate(mut self, sample_rate: f64) -> Self {
        self.carrier = self.carrier.with_sample_rate(sample_rate);
        self
    }

    /// Override the IFFT size (defaults to the next power of two)
    pub fn fft_size(mut self, fft_size: usize) -> Self {
        self.carrier = self.carrier.with_fft_size(fft_size);
        self
    }

    /// Allocate a PDSCH with random payload and embedded DMRS
    pub fn add_pdsch(&mut self, config: PdschConfig) -> Result<&mut Self, PhyError> {
        let channel = PhysicalChannel::pdsch(config, self.carrier.cell_id, &mut self.rng)?;
        self.grid.add_channel(&channel)?;
        Ok(self)
    }

    /// Reserve a CORESET region (zero-valued placeholder)
    pub fn add_coreset(&mut self, config: PdcchConfig) -> Result<&mut Self, PhyError> {
        let channel = PhysicalChannel::coreset(config)?;
        self.grid.add_channel(&channel)?;
        Ok(self)
    }

    /// Fill a CORESET-shaped region with PDCCH payload and DMRS
    pub fn add_pdcch(&mut self, config: PdcchConfig) -> Result<&mut Self, PhyError> {
        let channel = PhysicalChannel::pdcch(config, self.carrier.cell_id, &mut self.rng)?;
        self.grid.add_channel(&channel)?;
        Ok(self)
    }

    /// Reserve a CORESET and immediately fill it with a PDCCH
    pub fn add_coreset_pdcch(&mut self, config: PdcchConfig) -> Result<&mut Self, PhyError> {
        self.add_coreset(config.clone())?;
        self.add_pdcch(config)
    }

    /// Allocate an SS/PBCH block (PSS, SSS, PBCH with its DMRS)
    pub fn add_ssb(&mut self, config: SsbConfig) -> Result<&mut Self, PhyError> {
        let channel = PhysicalChannel::ss_block(config, self.carrier.cell_id, &mut self.rng)?;
        self.grid.add_channel(&channel)?;
        Ok(self)
    }

    /// Allocate a standalone scattered DMRS pattern
    pub fn add_dmrs(&mut self, config: DmrsConfig) -> Result<&mut Self, PhyError> {
        let channel = PhysicalChannel::dmrs(config, self.carrier.cell_id)?;
        self.grid.add_channel(&channel)?;
        Ok(self)
    }

    /// Synthesize the full frame at the carrier's output rate
    pub fn generate(&self) -> Result<Vec<Complex32>, PhyError> {
        WaveformGenerator::new(&self.carrier)?.generate(&self.grid)
    }

    /// Timing summary for the waveform `generate` would produce
    pub fn parameters(&self) -> Result<WaveformParameters, PhyError> {
        WaveformGenerator::new(&self.carrier)?.parameters()
    }

    pub fn grid(&self) -> &ResourceGrid {
        &self.grid
    }

    pub fn carrier(&self) -> &CarrierConfig {
        &self.carrier
    }
}
