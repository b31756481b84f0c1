//! Frame waveform synthesis
//!
//! Walks the resource grid symbol by symbol through the OFDM modulator.
//! Synthesis always runs at an integer multiple of the subcarrier spacing:
//! the requested rate when it qualifies, otherwise the standard rate for
//! the carrier's FFT size with a final rational resampling stage.

use crate::carrier::CarrierConfig;
use crate::ofdm::{calculate_ofdm_params, OfdmModulator, OfdmParams};
use crate::resampler::{resample_waveform, resampled_len};
use crate::resource_grid::ResourceGrid;
use crate::PhyError;
use num_complex::Complex32;
use serde::Serialize;
use tracing::{debug, info};

/// Timing summary of a synthesized waveform, serializable for export
#[derive(Debug, Clone, Serialize)]
pub struct WaveformParameters {
    pub numerology: u8,
    pub subcarrier_spacing: u32,
    pub num_rb: u16,
    pub fft_size: usize,
    pub useful_size: usize,
    pub cp_short: usize,
    pub cp_long: usize,
    pub cp_per_symbol: Vec<usize>,
    pub sample_rate: f64,
    pub slot_duration: f64,
    pub total_slots: u16,
    pub total_symbols: usize,
    pub total_samples: usize,
}

/// Grid-to-samples converter for one carrier
pub struct WaveformGenerator {
    carrier: CarrierConfig,
    modulator: OfdmModulator,
    /// Rate the OFDM core runs at; differs from the carrier's requested
    /// rate only when a resampling stage is needed
    synthesis_rate: f64,
}

impl WaveformGenerator {
    pub fn new(carrier: &CarrierConfig) -> Result<Self, PhyError> {
        let scs_hz = carrier.numerology.subcarrier_spacing.as_hz();
        let ratio = carrier.sample_rate / scs_hz;
        let synthesis_rate = if (ratio - ratio.round()).abs() <= 1e-9 {
            carrier.sample_rate
        } else {
            carrier.standard_sample_rate()
        };
        if synthesis_rate != carrier.sample_rate {
            info!(
                "Requested rate {} Hz needs resampling; synthesizing at {} Hz",
                carrier.sample_rate, synthesis_rate
            );
        }

        let params = calculate_ofdm_params(carrier, synthesis_rate)?;
        Ok(Self {
            carrier: carrier.clone(),
            modulator: OfdmModulator::new(params),
            synthesis_rate,
        })
    }

    pub fn ofdm_params(&self) -> &OfdmParams {
        self.modulator.params()
    }

    /// Synthesize the time-domain samples of one slot
    pub fn generate_slot(&self, grid: &ResourceGrid, slot: u16) -> Result<Vec<Complex32>, PhyError> {
        if slot >= grid.total_slots() {
            return Err(PhyError::Configuration(format!(
                "Slot {} outside frame of {} slots",
                slot,
                grid.total_slots()
            )));
        }
        let params = self.modulator.params();
        let sps = grid.symbols_per_slot() as usize;
        let mut samples = Vec::with_capacity(params.slot_samples);
        for l in 0..sps {
            let column = grid.symbol_view(slot as usize * sps + l);
            samples.extend(self.modulator.generate_symbol(column, l));
        }
        debug!("Slot {}: {} samples", slot, samples.len());
        Ok(samples)
    }

    /// Synthesize the full 10 ms frame, resampling to the requested rate
    /// when it differs from the synthesis rate
    pub fn generate(&self, grid: &ResourceGrid) -> Result<Vec<Complex32>, PhyError> {
        let params = self.modulator.params();
        let total_slots = grid.total_slots();
        let mut waveform = Vec::with_capacity(params.slot_samples * total_slots as usize);
        for slot in 0..total_slots {
            waveform.extend(self.generate_slot(grid, slot)?);
        }

        if self.synthesis_rate != self.carrier.sample_rate {
            waveform =
                resample_waveform(&waveform, self.synthesis_rate, self.carrier.sample_rate)?;
        }
        info!(
            "Frame waveform: {} samples at {} Hz",
            waveform.len(),
            self.carrier.sample_rate
        );
        Ok(waveform)
    }

    /// Timing summary matching what `generate` produces
    pub fn parameters(&self) -> Result<WaveformParameters, PhyError> {
        let params = self.modulator.params();
        let total_slots = self.carrier.total_slots();
        let synthesized = params.slot_samples * total_slots as usize;
        let total_samples = if self.synthesis_rate != self.carrier.sample_rate {
            resampled_len(synthesized, self.synthesis_rate, self.carrier.sample_rate)?
        } else {
            synthesized
        };

        Ok(WaveformParameters {
            numerology: self.carrier.numerology.mu,
            subcarrier_spacing: self.carrier.numerology.subcarrier_spacing.as_khz(),
            num_rb: self.carrier.n_resource_blocks,
            fft_size: params.n_fft,
            useful_size: params.n_useful,
            cp_short: params.cp_short,
            cp_long: params.cp_long,
            cp_per_symbol: params.cp_per_symbol.clone(),
            sample_rate: self.carrier.sample_rate,
            slot_duration: self.carrier.numerology.slot_duration_s(),
            total_slots,
            total_symbols: self.carrier.total_symbols(),
            total_samples,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::types::Bandwidth;

    fn setup(fs: f64) -> (CarrierConfig, ResourceGrid) {
        let carrier = CarrierConfig::from_bandwidth(Bandwidth::Bw10, 1, 1)
            .unwrap()
            .with_sample_rate(fs);
        let grid = ResourceGrid::new(&carrier);
        (carrier, grid)
    }

    #[test]
    fn test_frame_sample_count_integer_rate() {
        let (carrier, grid) = setup(11.52e6);
        let generator = WaveformGenerator::new(&carrier).unwrap();
        let waveform = generator.generate(&grid).unwrap();

        // mu=1: 20 slots of round(11.52 MHz * 0.5 ms) samples
        assert_eq!(waveform.len(), 20 * 5760);
        assert_eq!(generator.parameters().unwrap().total_samples, waveform.len());
    }

    #[test]
    fn test_frame_sample_count_with_resampling() {
        let (carrier, grid) = setup(10e6);
        let generator = WaveformGenerator::new(&carrier).unwrap();
        assert_eq!(generator.ofdm_params().sample_rate, 15.36e6);

        let waveform = generator.generate(&grid).unwrap();
        // 10 MHz over 10 ms
        assert_eq!(waveform.len(), 100_000);
        assert_eq!(generator.parameters().unwrap().total_samples, waveform.len());
    }

    #[test]
    fn test_integer_rate_too_narrow_for_grid() {
        // 7.68 MHz divides the 30 kHz SCS exactly but the 256-point FFT
        // cannot hold the 288 occupied subcarriers
        let (carrier, _grid) = setup(7.68e6);
        assert!(matches!(
            WaveformGenerator::new(&carrier),
            Err(PhyError::Configuration(_))
        ));
    }

    #[test]
    fn test_empty_grid_is_silent() {
        let (carrier, grid) = setup(11.52e6);
        let generator = WaveformGenerator::new(&carrier).unwrap();
        let slot = generator.generate_slot(&grid, 0).unwrap();
        assert!(slot.iter().all(|v| v.norm() < 1e-9));
    }

    #[test]
    fn test_slot_bounds() {
        let (carrier, grid) = setup(11.52e6);
        let generator = WaveformGenerator::new(&carrier).unwrap();
        assert!(generator.generate_slot(&grid, 20).is_err());
    }
}
