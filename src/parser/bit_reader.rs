/// Reads variable-width codes least-significant-bit first, the order GIF packs LZW codes in.
pub struct BitReader<'a> {
    buf: &'a [u8],
    // next byte to pull into the bit buffer
    position: usize,
    bits: u32,
    bit_count: u32,
}

impl<'a> BitReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            position: 0,
            bits: 0,
            bit_count: 0,
        }
    }

    /// Returns `None` once the buffer runs out before `count` bits are available.
    pub fn next(&mut self, count: u32) -> Option<u16> {
        debug_assert!((1..=12).contains(&count));

        // whole bytes only, the buffer never holds a partial byte from the input
        while self.bit_count < count {
            let byte = *self.buf.get(self.position)?;
            self.position += 1;
            self.bits |= u32::from(byte) << self.bit_count;
            self.bit_count += 8;
        }

        let value = self.bits & ((1 << count) - 1);
        self.bits >>= count;
        self.bit_count -= count;
        Some(value as u16)
    }
}
