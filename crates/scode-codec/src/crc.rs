//! CRC-8 with generator polynomial `x^8 + x^2 + x + 1` (0x07), no reflection.
//!
//! To generate a check byte call [`crc8`] with `seed = 0`. To verify, pass the
//! received check byte as `seed`: a residual of `0` means the data is intact.

/// Generator polynomial without the implicit `x^8` term.
pub const POLYNOMIAL: u8 = 0x07;

/// Byte-at-a-time lookup table derived from [`POLYNOMIAL`].
pub const TABLE: [u8; 256] = build_table(POLYNOMIAL);

const fn build_table(poly: u8) -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ poly
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Incremental CRC-8 state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Crc8 {
    value: u8,
}

impl Crc8 {
    pub const fn new() -> Self {
        Self { value: 0 }
    }

    /// Feed more bytes into the checksum.
    pub fn update(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.value = TABLE[(self.value ^ b) as usize];
        }
    }

    /// Final value combined with `seed`.
    pub fn finish(self, seed: u8) -> u8 {
        self.value ^ seed
    }
}

/// Compute (seed 0) or verify (seed = received CRC) the CRC-8 of `bytes`.
pub fn crc8(bytes: &[u8], seed: u8) -> u8 {
    let mut crc = Crc8::new();
    crc.update(bytes);
    crc.finish(seed)
}

/// Bit-serial reference division. Produces the same output as [`crc8`].
pub fn crc8_bitwise(bytes: &[u8], seed: u8) -> u8 {
    let mut crc = 0u8;
    for &b in bytes {
        crc ^= b;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ POLYNOMIAL
            } else {
                crc << 1
            };
        }
    }
    crc ^ seed
}
