//! Rational sample-rate conversion for synthesized waveforms
//!
//! The OFDM core always synthesizes at an integer multiple of the
//! subcarrier spacing; when the requested output rate is not one, the
//! finished waveform is converted here with a polyphase windowed-sinc
//! lowpass sized from the rational approximation of the rate ratio.

use crate::PhyError;
use num_complex::Complex32;
use std::f32::consts::PI;
use tracing::debug;

/// Taps per polyphase branch
const FILTER_ORDER: usize = 32;
/// Cutoff as a fraction of the narrower Nyquist band
const CUTOFF_FACTOR: f64 = 0.45;
/// Denominator bound for the rational rate approximation
const MAX_DENOMINATOR: usize = 1000;

/// Convert a waveform from `input_rate` to `output_rate`
///
/// Returns the input unchanged when the rates already match. Fails with
/// `Configuration` when either rate is non-positive.
pub fn resample_waveform(
    input: &[Complex32],
    input_rate: f64,
    output_rate: f64,
) -> Result<Vec<Complex32>, PhyError> {
    let (interp, decim) = rate_factors(input_rate, output_rate)?;
    if interp == decim {
        return Ok(input.to_vec());
    }
    debug!(
        "Resampling {} samples: {} Hz -> {} Hz (L={}, M={})",
        input.len(),
        input_rate,
        output_rate,
        interp,
        decim
    );

    let cutoff_hz = CUTOFF_FACTOR * input_rate.min(output_rate) / 2.0;
    let taps = design_lowpass_filter(
        FILTER_ORDER * interp,
        cutoff_hz,
        input_rate * interp as f64,
    );

    // Polyphase decomposition with the interpolation gain folded in
    let gain = interp as f32;
    let mut polyphase = vec![vec![0.0f32; FILTER_ORDER]; interp];
    for (i, &tap) in taps.iter().enumerate() {
        polyphase[i % interp][i / interp] = tap * gain;
    }

    let out_len = (input.len() * interp + decim - 1) / decim;
    let mut output = Vec::with_capacity(out_len);
    for k in 0..out_len {
        let t = k * decim;
        let phase = &polyphase[t % interp];
        let anchor = t / interp;
        let mut acc = Complex32::new(0.0, 0.0);
        for (j, &coeff) in phase.iter().enumerate() {
            if j > anchor {
                break;
            }
            acc += input[anchor - j] * coeff;
        }
        output.push(acc);
    }
    Ok(output)
}

/// Output length produced by `resample_waveform` for `input_len` samples
pub fn resampled_len(
    input_len: usize,
    input_rate: f64,
    output_rate: f64,
) -> Result<usize, PhyError> {
    let (interp, decim) = rate_factors(input_rate, output_rate)?;
    Ok((input_len * interp + decim - 1) / decim)
}

fn rate_factors(input_rate: f64, output_rate: f64) -> Result<(usize, usize), PhyError> {
    if input_rate <= 0.0 || output_rate <= 0.0 {
        return Err(PhyError::Configuration(format!(
            "Resampling rates must be positive, got {} -> {}",
            input_rate, output_rate
        )));
    }
    Ok(rational_approximation(
        output_rate / input_rate,
        MAX_DENOMINATOR,
    ))
}

/// Continued-fraction rational approximation of `value`
///
/// The denominator never exceeds `max_denominator`: a convergent that
/// would pass the bound is discarded and the previous one returned.
fn rational_approximation(value: f64, max_denominator: usize) -> (usize, usize) {
    let mut a = value.floor() as i64;
    let mut h1 = 1i64;
    let mut k1 = 0i64;
    let mut h = a;
    let mut k = 1i64;

    let mut remainder = value - a as f64;

    while remainder.abs() > 1e-10 {
        let x = 1.0 / remainder;
        a = x.floor() as i64;
        remainder = x - a as f64;

        let h_next = a * h + h1;
        let k_next = a * k + k1;
        if k_next > max_denominator as i64 {
            break;
        }
        h1 = h;
        k1 = k;
        h = h_next;
        k = k_next;
    }

    (h.abs() as usize, k.abs().max(1) as usize)
}

/// Windowed-sinc lowpass, Hamming window, unity DC gain
fn design_lowpass_filter(num_taps: usize, cutoff_hz: f64, sample_rate: f64) -> Vec<f32> {
    let mut taps = vec![0.0f32; num_taps];
    let center = (num_taps - 1) as f32 / 2.0;
    let omega_c = 2.0 * PI * (cutoff_hz / sample_rate) as f32;

    for (i, tap) in taps.iter_mut().enumerate() {
        let n = i as f32 - center;
        let sinc = if n.abs() < 1e-10 {
            omega_c / PI
        } else {
            (omega_c * n).sin() / (PI * n)
        };
        let window = 0.54 - 0.46 * (2.0 * PI * i as f32 / (num_taps - 1) as f32).cos();
        *tap = sinc * window;
    }

    let sum: f32 = taps.iter().sum();
    for tap in &mut taps {
        *tap /= sum;
    }

    taps
}
