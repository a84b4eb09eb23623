use super::ParserError;

/// Cursor over an in-memory GIF stream. Every read checks the remaining length first and
/// fails with [`ParserError::InsufficientData`] instead of reading past the end.
#[derive(Debug)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    position: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, position: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.position
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], ParserError> {
        let remaining = self.remaining();
        if count > remaining {
            return Err(ParserError::InsufficientData { needed: count, remaining });
        }

        let bytes = &self.buf[self.position..self.position + count];
        self.position += count;
        Ok(bytes)
    }

    pub fn read_byte(&mut self) -> Result<u8, ParserError> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, ParserError> {
        // GIF89a: multi-byte numeric fields are ordered with the least significant byte first
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn skip(&mut self, count: usize) -> Result<(), ParserError> {
        self.read_bytes(count).map(|_| ())
    }

    /// Concatenates a series of length-prefixed sub-blocks, stopping at the zero-length
    /// terminator.
    pub fn read_data_sub_blocks(&mut self) -> Result<Vec<u8>, ParserError> {
        let mut block_size = self.read_byte()?;

        // there could be more than one block, but we do know we'll at least have 1 sub-block.
        // allocate capacity to account for it.
        let mut result = Vec::with_capacity(block_size.into());

        while block_size != 0 {
            result.extend_from_slice(self.read_bytes(block_size.into())?);
            block_size = self.read_byte()?;
        }

        Ok(result)
    }

    pub fn skip_data_sub_blocks(&mut self) -> Result<(), ParserError> {
        loop {
            match self.read_byte()? {
                0 => return Ok(()),
                block_size => self.skip(block_size.into())?,
            }
        }
    }
}
