//! Ogg page checksum.
//!
//! CRC-32 with polynomial `0x04c11db7`, processed MSB first, zero initial
//! value, no reflection and no final XOR. This is not the zlib CRC-32.

/// CRC lookup table for Ogg.
static CRC_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut r = (i as u32) << 24;
        let mut j = 0;
        while j < 8 {
            if r & 0x80000000 != 0 {
                r = (r << 1) ^ 0x04c11db7;
            } else {
                r <<= 1;
            }
            j += 1;
        }
        table[i] = r;
        i += 1;
    }
    table
};

/// Incremental Ogg checksum.
///
/// Header and body live in separate buffers, so the checksum is fed in
/// pieces and read out with [`Crc::finish`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Crc {
    value: u32,
}

impl Crc {
    /// Creates a checksum with the zero initial value.
    pub const fn new() -> Self {
        Self { value: 0 }
    }

    /// Feeds more bytes.
    pub fn update(&mut self, data: &[u8]) {
        let mut crc = self.value;
        for &byte in data {
            crc = (crc << 8) ^ CRC_TABLE[((crc >> 24) as u8 ^ byte) as usize];
        }
        self.value = crc;
    }

    /// Returns the checksum of everything fed so far.
    pub fn finish(&self) -> u32 {
        self.value
    }
}

/// Computes the Ogg checksum of a single buffer.
pub fn checksum(data: &[u8]) -> u32 {
    let mut crc = Crc::new();
    crc.update(data);
    crc.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_empty() {
        assert_eq!(checksum(&[]), 0);
    }

    #[test]
    fn test_checksum_check_value() {
        // Non-reflected, zero init, no xorout.
        assert_eq!(checksum(b"123456789"), 0x89a1897f);
        assert_eq!(checksum(b"OggS"), 0x5fb0a94f);
    }

    #[test]
    fn test_checksum_table_entries() {
        assert_eq!(CRC_TABLE[0], 0);
        assert_eq!(CRC_TABLE[1], 0x04c11db7);
        assert_eq!(CRC_TABLE[128], 0x690ce0ee);
    }

    #[test]
    fn test_incremental_matches_oneshot() {
        let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        for split in [0, 1, 27, 500, 999, 1000] {
            let mut crc = Crc::new();
            crc.update(&data[..split]);
            crc.update(&data[split..]);
            assert_eq!(crc.finish(), checksum(&data), "split at {}", split);
        }
    }

    #[test]
    fn test_checksum_detects_single_bit_flip() {
        let data = b"Hello, Ogg world!".to_vec();
        let original = checksum(&data);
        for i in 0..data.len() * 8 {
            let mut flipped = data.clone();
            flipped[i / 8] ^= 1 << (i % 8);
            assert_ne!(checksum(&flipped), original);
        }
    }
}
