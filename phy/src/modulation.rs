//! Constellation mapping per 3GPP TS 38.211 Section 5.1
//!
//! Implements the closed-form Gray-coded bit-to-symbol formulas with the
//! standard power normalizations, plus random filler-symbol generation for
//! payload resource elements. Randomness is an explicit, seedable RNG
//! instance threaded through the call so tests are reproducible.

use common::types::ModulationScheme;
use ndarray::Array2;
use num_complex::Complex32;
use rand::rngs::StdRng;
use rand::Rng;

/// Map one bit tuple to a normalized constellation point
///
/// `bits` must hold exactly `scheme.bits_per_symbol()` values in {0, 1}.
pub fn map_bits(bits: &[u8], scheme: ModulationScheme) -> Complex32 {
    debug_assert_eq!(bits.len(), scheme.bits_per_symbol());
    let b = |i: usize| 1.0 - 2.0 * bits[i] as f32;

    match scheme {
        ModulationScheme::Bpsk => {
            let v = b(0) / 2.0_f32.sqrt();
            Complex32::new(v, v)
        }
        ModulationScheme::Qpsk => {
            let norm = 1.0 / 2.0_f32.sqrt();
            Complex32::new(norm * b(0), norm * b(1))
        }
        ModulationScheme::Qam16 => {
            let norm = 1.0 / 10.0_f32.sqrt();
            Complex32::new(
                norm * b(0) * (2.0 - b(2)),
                norm * b(1) * (2.0 - b(3)),
            )
        }
        ModulationScheme::Qam64 => {
            let norm = 1.0 / 42.0_f32.sqrt();
            Complex32::new(
                norm * b(0) * (4.0 - b(2) * (2.0 - b(4))),
                norm * b(1) * (4.0 - b(3) * (2.0 - b(5))),
            )
        }
        ModulationScheme::Qam256 => {
            let norm = 1.0 / 170.0_f32.sqrt();
            Complex32::new(
                norm * b(0) * (8.0 - b(2) * (4.0 - b(4) * (2.0 - b(6)))),
                norm * b(1) * (8.0 - b(3) * (4.0 - b(5) * (2.0 - b(7)))),
            )
        }
    }
}

/// Draw one random symbol of the requested scheme
pub fn random_symbol(scheme: ModulationScheme, rng: &mut StdRng) -> Complex32 {
    let mut bits = [0u8; 8];
    let n = scheme.bits_per_symbol();
    for bit in bits.iter_mut().take(n) {
        *bit = rng.gen_range(0..2);
    }
    map_bits(&bits[..n], scheme)
}

/// Generate a (subcarriers x symbols) block of random modulated symbols
pub fn random_symbols(
    n_sc: usize,
    n_symbols: usize,
    scheme: ModulationScheme,
    rng: &mut StdRng,
) -> Array2<Complex32> {
    Array2::from_shape_fn((n_sc, n_symbols), |_| random_symbol(scheme, rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_qpsk_levels() {
        let norm = 1.0 / 2.0_f32.sqrt();
        assert_eq!(map_bits(&[0, 0], ModulationScheme::Qpsk), Complex32::new(norm, norm));
        assert_eq!(map_bits(&[1, 1], ModulationScheme::Qpsk), Complex32::new(-norm, -norm));
        assert_eq!(map_bits(&[0, 1], ModulationScheme::Qpsk), Complex32::new(norm, -norm));
    }

    #[test]
    fn test_qam16_levels() {
        let norm = 1.0 / 10.0_f32.sqrt();
        // b = [0,0,0,0] -> (1*(2-1), 1*(2-1)) = (1, 1)/sqrt(10)
        assert_eq!(
            map_bits(&[0, 0, 0, 0], ModulationScheme::Qam16),
            Complex32::new(norm, norm)
        );
        // b = [0,0,1,1] -> (3, 3)/sqrt(10)
        assert_eq!(
            map_bits(&[0, 0, 1, 1], ModulationScheme::Qam16),
            Complex32::new(3.0 * norm, 3.0 * norm)
        );
        // All 16 points lie on the +-1/+-3 lattice
        for idx in 0u8..16 {
            let bits = [idx >> 3 & 1, idx >> 2 & 1, idx >> 1 & 1, idx & 1];
            let sym = map_bits(&bits, ModulationScheme::Qam16);
            let level_ok = |v: f32| {
                let scaled = (v / norm).abs();
                (scaled - 1.0).abs() < 1e-5 || (scaled - 3.0).abs() < 1e-5
            };
            assert!(level_ok(sym.re) && level_ok(sym.im));
        }
    }

    #[test]
    fn test_constellation_unit_power() {
        // Averaged over the full constellation, every scheme is normalized
        // to unit power
        for scheme in [
            ModulationScheme::Bpsk,
            ModulationScheme::Qpsk,
            ModulationScheme::Qam16,
            ModulationScheme::Qam64,
            ModulationScheme::Qam256,
        ] {
            let n = scheme.bits_per_symbol();
            let mut power = 0.0f64;
            for idx in 0u32..(1 << n) {
                let bits: Vec<u8> = (0..n).map(|i| ((idx >> (n - 1 - i)) & 1) as u8).collect();
                power += map_bits(&bits, scheme).norm_sqr() as f64;
            }
            power /= (1u64 << n) as f64;
            assert!((power - 1.0).abs() < 1e-6, "{:?}: {}", scheme, power);
        }
    }

    #[test]
    fn test_random_symbols_reproducible() {
        let mut rng_a = StdRng::seed_from_u64(7);
        let mut rng_b = StdRng::seed_from_u64(7);
        let a = random_symbols(24, 4, ModulationScheme::Qam64, &mut rng_a);
        let b = random_symbols(24, 4, ModulationScheme::Qam64, &mut rng_b);
        assert_eq!(a, b);
        assert_eq!(a.dim(), (24, 4));
    }
}
