//! OFDM parameter derivation and time-domain symbol synthesis
//!
//! Cyclic prefix lengths follow the TS 38.211 reference ratios against the
//! useful symbol length, then get reconciled per slot so that every slot
//! lands on exactly `round(fs * 1ms / 2^mu)` samples regardless of the
//! sample rate's relation to the nominal 2048-point timing.

use crate::carrier::{CarrierConfig, CyclicPrefix};
use crate::PhyError;
use ndarray::ArrayView1;
use num_complex::Complex32;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;
use tracing::debug;

/// Derived timing for one carrier at one sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct OfdmParams {
    /// Synthesis sample rate in Hz
    pub sample_rate: f64,
    /// Numerology index
    pub mu: u8,
    /// Useful symbol length, `sample_rate / scs`
    pub n_useful: usize,
    /// IFFT size (next power of two above `n_useful`, or user override)
    pub n_fft: usize,
    /// Nominal short CP length before reconciliation
    pub cp_short: usize,
    /// Nominal long CP length before reconciliation
    pub cp_long: usize,
    /// Reconciled CP length for each symbol of a slot
    pub cp_per_symbol: Vec<usize>,
    /// Exact samples per slot, `round(sample_rate * 1ms / 2^mu)`
    pub slot_samples: usize,
}

impl OfdmParams {
    /// Samples of the symbol at `index` within a slot, CP included
    pub fn symbol_samples(&self, index: usize) -> usize {
        self.cp_per_symbol[index] + self.n_useful
    }
}

/// Derive OFDM timing for a carrier at the given synthesis rate
///
/// Fails with `Configuration` when the sample rate is not an integer
/// multiple of the subcarrier spacing, or when a custom FFT size is
/// smaller than the useful symbol length.
pub fn calculate_ofdm_params(
    carrier: &CarrierConfig,
    sample_rate: f64,
) -> Result<OfdmParams, PhyError> {
    let scs_hz = carrier.numerology.subcarrier_spacing.as_hz();
    let ratio = sample_rate / scs_hz;
    if (ratio - ratio.round()).abs() > 1e-9 {
        return Err(PhyError::Configuration(format!(
            "Sample rate {} Hz is not an integer multiple of the {} Hz subcarrier spacing",
            sample_rate, scs_hz
        )));
    }
    let n_useful = ratio.round() as usize;

    let n_fft = match carrier.fft_size {
        Some(custom) => {
            if custom < n_useful {
                return Err(PhyError::Configuration(format!(
                    "FFT size {} smaller than useful symbol length {}",
                    custom, n_useful
                )));
            }
            custom
        }
        None => n_useful.next_power_of_two(),
    };
    // A low sample rate can pass the integer check yet leave the IFFT too
    // narrow for the occupied band
    if n_fft < carrier.n_subcarriers() {
        return Err(PhyError::Configuration(format!(
            "FFT size {} cannot hold the {} occupied subcarriers",
            n_fft,
            carrier.n_subcarriers()
        )));
    }

    let mu = carrier.numerology.mu;
    let symbols_per_slot = carrier.numerology.symbols_per_slot as usize;

    // Reference CP lengths scale with the useful length, not the FFT size,
    // so an oversized IFFT never stretches the prefix.
    let (cp_short, cp_long, long_symbols): (usize, usize, Vec<usize>) = match carrier.cyclic_prefix
    {
        CyclicPrefix::Normal => {
            let short = 144 * n_useful / 2048;
            let long = 160 * n_useful / 2048;
            // The long CP falls on subframe symbols 0 and 7 * 2^mu; for
            // mu >= 1 the second lands at the start of the next slot.
            let longs = if mu == 0 { vec![0, 7] } else { vec![0] };
            (short, long, longs)
        }
        CyclicPrefix::Extended => {
            let cp = 512 * n_useful / 2048;
            (cp, cp, Vec::new())
        }
    };

    let mut cp_per_symbol = vec![cp_short; symbols_per_slot];
    for &l in &long_symbols {
        cp_per_symbol[l] = cp_long;
    }

    let slot_samples =
        (sample_rate * carrier.numerology.slot_duration_s()).round() as usize;
    let nominal: usize = cp_per_symbol.iter().map(|cp| cp + n_useful).sum();

    if nominal < slot_samples {
        // Distribute the deficit one sample at a time, long-CP symbols
        // first, then short-CP symbols in ascending order.
        let mut order = long_symbols.clone();
        order.extend((0..symbols_per_slot).filter(|l| !long_symbols.contains(l)));
        let mut remaining = slot_samples - nominal;
        while remaining > 0 {
            for &l in &order {
                if remaining == 0 {
                    break;
                }
                cp_per_symbol[l] += 1;
                remaining -= 1;
            }
        }
    } else if nominal > slot_samples {
        // Shave the surplus from short-CP symbols in descending order
        // before touching the long ones.
        let mut order: Vec<usize> = (0..symbols_per_slot)
            .rev()
            .filter(|l| !long_symbols.contains(l))
            .collect();
        order.extend(long_symbols.iter().rev().copied());
        let mut remaining = nominal - slot_samples;
        while remaining > 0 {
            for &l in &order {
                if remaining == 0 {
                    break;
                }
                if cp_per_symbol[l] > 0 {
                    cp_per_symbol[l] -= 1;
                    remaining -= 1;
                }
            }
        }
    }

    debug!(
        "OFDM params: fs={} Hz, n_useful={}, n_fft={}, slot={} samples, cp={:?}",
        sample_rate, n_useful, n_fft, slot_samples, cp_per_symbol
    );

    Ok(OfdmParams {
        sample_rate,
        mu,
        n_useful,
        n_fft,
        cp_short,
        cp_long,
        cp_per_symbol,
        slot_samples,
    })
}

/// Frequency-to-time converter for one OFDM parameter set
pub struct OfdmModulator {
    params: OfdmParams,
    ifft: Arc<dyn Fft<f32>>,
}

impl OfdmModulator {
    pub fn new(params: OfdmParams) -> Self {
        let mut planner = FftPlanner::new();
        let ifft = planner.plan_fft_inverse(params.n_fft);
        Self { params, ifft }
    }

    pub fn params(&self) -> &OfdmParams {
        &self.params
    }

    /// Synthesize one time-domain symbol from a frequency-domain column
    ///
    /// The subcarriers are zero-padded to the FFT size with the occupied
    /// band centered on DC, IFFT'd with 1/N scaling, cropped to the useful
    /// length and prefixed with the CP for `symbol_in_slot`.
    pub fn generate_symbol(
        &self,
        freq_data: ArrayView1<'_, Complex32>,
        symbol_in_slot: usize,
    ) -> Vec<Complex32> {
        let n_fft = self.params.n_fft;
        let n_useful = self.params.n_useful;
        let n_sc = freq_data.len();

        let mut buffer = vec![Complex32::new(0.0, 0.0); n_fft];
        let pad = ((n_fft - n_sc) as f64 / 2.0).round() as usize;
        for (i, &v) in freq_data.iter().enumerate() {
            buffer[pad + i] = v;
        }

        // Move DC from the buffer center to bin 0 before the IFFT
        buffer.rotate_left(n_fft / 2);
        self.ifft.process(&mut buffer);
        let scale = 1.0 / n_fft as f32;
        for v in buffer.iter_mut() {
            *v *= scale;
        }

        // Crop the oversized IFFT output back to the useful length
        let crop = (n_fft - n_useful) / 2;
        let useful = &buffer[crop..crop + n_useful];

        let cp = self.params.cp_per_symbol[symbol_in_slot];
        let mut symbol = Vec::with_capacity(cp + n_useful);
        symbol.extend_from_slice(&useful[n_useful - cp..]);
        symbol.extend_from_slice(useful);
        symbol
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::types::Bandwidth;
    use ndarray::Array1;

    fn carrier(bandwidth: Bandwidth, mu: u8, fs: f64) -> CarrierConfig {
        CarrierConfig::from_bandwidth(bandwidth, mu, 0)
            .unwrap()
            .with_sample_rate(fs)
    }

    #[test]
    fn test_reconciled_slot_mu1() {
        // 11.52 MHz at 30 kHz SCS: nominal CPs undershoot the slot by 3
        let c = carrier(Bandwidth::Bw10, 1, 11.52e6);
        let p = calculate_ofdm_params(&c, 11.52e6).unwrap();
        assert_eq!(p.n_useful, 384);
        assert_eq!(p.n_fft, 512);
        assert_eq!(p.cp_short, 27);
        assert_eq!(p.cp_long, 30);
        assert_eq!(p.slot_samples, 5760);
        assert_eq!(p.cp_per_symbol[0], 31);
        assert_eq!(p.cp_per_symbol[1], 28);
        assert_eq!(p.cp_per_symbol[2], 28);
        assert!(p.cp_per_symbol[3..].iter().all(|&cp| cp == 27));
        let total: usize = (0..14).map(|l| p.symbol_samples(l)).sum();
        assert_eq!(total, 5760);
    }

    #[test]
    fn test_standard_rate_mu0_needs_no_reconciliation() {
        let c = carrier(Bandwidth::Bw20, 0, 30.72e6);
        let p = calculate_ofdm_params(&c, 30.72e6).unwrap();
        assert_eq!(p.n_useful, 2048);
        assert_eq!(p.n_fft, 2048);
        assert_eq!(p.cp_per_symbol[0], 160);
        assert_eq!(p.cp_per_symbol[7], 160);
        assert_eq!(p.cp_per_symbol[1], 144);
        assert_eq!(p.slot_samples, 30720);
        let total: usize = (0..14).map(|l| p.symbol_samples(l)).sum();
        assert_eq!(total, 30720);
    }

    #[test]
    fn test_non_integer_rate_rejected() {
        let c = carrier(Bandwidth::Bw10, 0, 10e6);
        assert!(matches!(
            calculate_ofdm_params(&c, 10e6),
            Err(PhyError::Configuration(_))
        ));
    }

    #[test]
    fn test_fft_too_narrow_for_grid_rejected() {
        // 7.68 MHz at 30 kHz SCS is a legal integer ratio (256 samples)
        // but the 24-RB grid needs 288 subcarriers
        let c = carrier(Bandwidth::Bw10, 1, 7.68e6);
        assert!(matches!(
            calculate_ofdm_params(&c, 7.68e6),
            Err(PhyError::Configuration(_))
        ));
    }

    #[test]
    fn test_undersized_fft_rejected() {
        let c = carrier(Bandwidth::Bw10, 1, 11.52e6).with_fft_size(256);
        assert!(matches!(
            calculate_ofdm_params(&c, 11.52e6),
            Err(PhyError::Configuration(_))
        ));
    }

    #[test]
    fn test_cyclic_prefix_is_symbol_tail() {
        let c = carrier(Bandwidth::Bw10, 1, 11.52e6);
        let p = calculate_ofdm_params(&c, 11.52e6).unwrap();
        let modulator = OfdmModulator::new(p.clone());

        let n_sc = 288usize;
        let freq = Array1::from_shape_fn(n_sc, |i| {
            Complex32::new((i as f32 * 0.37).cos(), (i as f32 * 0.11).sin())
        });
        let symbol = modulator.generate_symbol(freq.view(), 3);
        let cp = p.cp_per_symbol[3];
        assert_eq!(symbol.len(), cp + p.n_useful);
        for i in 0..cp {
            let tail = symbol[symbol.len() - cp + i];
            assert!((symbol[i] - tail).norm() < 1e-5);
        }
    }

    #[test]
    fn test_single_tone_unit_amplitude() {
        // One active subcarrier produces a constant-modulus exponential
        let c = carrier(Bandwidth::Bw10, 1, 11.52e6);
        let p = calculate_ofdm_params(&c, 11.52e6).unwrap();
        let modulator = OfdmModulator::new(p.clone());

        let mut freq = Array1::from_elem(288, Complex32::new(0.0, 0.0));
        freq[100] = Complex32::new(1.0, 0.0);
        let symbol = modulator.generate_symbol(freq.view(), 1);
        let expected = 1.0 / p.n_fft as f32;
        for v in &symbol {
            assert!((v.norm() - expected).abs() < 1e-6);
        }
    }
}
