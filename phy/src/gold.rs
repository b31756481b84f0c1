//! Length-31 Gold sequence generation per 3GPP TS 38.211 Section 5.2.1
//!
//! All downlink reference signals derive their pseudo-random sequences from
//! this generator, seeded with a channel-specific 31-bit `c_init`.

/// Fixed LFSR fast-forward offset Nc
const NC: usize = 1600;

/// Dual-LFSR Gold sequence generator
///
/// Both registers are kept bit-packed: bit k of the word holds x(n+k), so
/// stepping shifts right and inserts the new bit at position 30. Identical
/// `c_init` values always yield identical output; there is no hidden state.
#[derive(Debug, Clone)]
pub struct GoldSequence {
    x1: u32,
    x2: u32,
}

impl GoldSequence {
    /// Create a generator for the given 31-bit initialization value
    ///
    /// x1 is fixed to [1, 0, ..., 0]; x2 takes the bits of `c_init`.
    /// Both registers are advanced by Nc = 1600 before any output.
    pub fn new(c_init: u32) -> Self {
        let mut gen = Self {
            x1: 1,
            x2: c_init & 0x7FFF_FFFF,
        };
        for _ in 0..NC {
            gen.step();
        }
        gen
    }

    /// Advance both registers by one position
    fn step(&mut self) {
        // x1(n+31) = (x1(n+3) + x1(n)) mod 2
        let x1_new = ((self.x1 >> 3) ^ self.x1) & 1;
        self.x1 = ((self.x1 >> 1) | (x1_new << 30)) & 0x7FFF_FFFF;

        // x2(n+31) = (x2(n+3) + x2(n+2) + x2(n+1) + x2(n)) mod 2
        let x2_new = ((self.x2 >> 3) ^ (self.x2 >> 2) ^ (self.x2 >> 1) ^ self.x2) & 1;
        self.x2 = ((self.x2 >> 1) | (x2_new << 30)) & 0x7FFF_FFFF;
    }

    /// Produce the next sequence bit c(n) = (x1(n+Nc) + x2(n+Nc)) mod 2
    pub fn next_bit(&mut self) -> u8 {
        let c = ((self.x1 ^ self.x2) & 1) as u8;
        self.step();
        c
    }

    /// Generate the first `len` bits of c(n) for a given seed
    pub fn generate(c_init: u32, len: usize) -> Vec<u8> {
        let mut gen = Self::new(c_init);
        (0..len).map(|_| gen.next_bit()).collect()
    }
}
