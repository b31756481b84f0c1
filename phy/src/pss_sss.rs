//! Primary and Secondary Synchronization Signal sequences
//!
//! BPSK m-sequences of length 127 per 3GPP TS 38.211 Sections 7.4.2.2
//! and 7.4.2.3, used by the SS/PBCH block allocator.

use num_complex::Complex32;

/// PSS/SSS sequence length in subcarriers
pub const SYNC_SEQ_LEN: usize = 127;

/// Generate the PSS sequence for a cell identity
///
/// d(n) = 1 - 2*x((n + 43*N_ID2) mod 127) with the generator
/// x(i+7) = (x(i+4) + x(i)) mod 2.
pub fn generate_pss(cell_id: u16) -> Vec<Complex32> {
    let nid2 = (cell_id % 3) as usize;

    let mut x = [0u8; SYNC_SEQ_LEN + 7];
    // Initial state per TS 38.211: x(6..0) = 1110110
    x[6] = 1;
    x[5] = 1;
    x[4] = 1;
    x[3] = 0;
    x[2] = 1;
    x[1] = 1;
    x[0] = 0;
    for i in 0..SYNC_SEQ_LEN {
        x[i + 7] = (x[i + 4] + x[i]) % 2;
    }

    let shift = (43 * nid2) % SYNC_SEQ_LEN;
    (0..SYNC_SEQ_LEN)
        .map(|n| {
            let m = (n + shift) % SYNC_SEQ_LEN;
            Complex32::new(1.0 - 2.0 * x[m] as f32, 0.0)
        })
        .collect()
}

/// Generate the SSS sequence for a cell identity
///
/// d(n) = [1 - 2*x0((n+m0) mod 127)] * [1 - 2*x1((n+m1) mod 127)] with
/// m0 = 15*(N_ID1 div 112) + 5*N_ID2 and m1 = N_ID1 mod 112.
pub fn generate_sss(cell_id: u16) -> Vec<Complex32> {
    let nid1 = (cell_id / 3) as usize;
    let nid2 = (cell_id % 3) as usize;

    let mut x0 = [0u8; SYNC_SEQ_LEN + 7];
    let mut x1 = [0u8; SYNC_SEQ_LEN + 7];
    x0[0] = 1;
    x1[0] = 1;
    for i in 0..SYNC_SEQ_LEN {
        x0[i + 7] = (x0[i + 4] + x0[i]) % 2;
        x1[i + 7] = (x1[i + 1] + x1[i]) % 2;
    }

    let m0 = 15 * (nid1 / 112) + 5 * nid2;
    let m1 = nid1 % 112;

    (0..SYNC_SEQ_LEN)
        .map(|n| {
            let d0 = 1.0 - 2.0 * x0[(n + m0) % SYNC_SEQ_LEN] as f32;
            let d1 = 1.0 - 2.0 * x1[(n + m1) % SYNC_SEQ_LEN] as f32;
            Complex32::new(d0 * d1, 0.0)
        })
        .collect()
}
