mod bit_reader;
mod byte_reader;
mod compositor;
mod decoder;
mod interlace;
mod lzw;

#[cfg(test)]
pub(crate) mod test_support;

pub use decoder::{decode, Decoder, LogicalScreenDescriptor, ParserError, Version, MAX_PIXELS};
pub use lzw::LzwError;

use image::Rgb;

#[repr(u8)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisposalMethod {
    /// Treated the same as [`DisposalMethod::DoNotDispose`].
    #[default]
    Unspecified = 0,
    DoNotDispose = 1,
    RestoreToBackgroundColor = 2,
    RestoreToPrevious = 3,
}

impl DisposalMethod {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(DisposalMethod::Unspecified),
            1 => Some(DisposalMethod::DoNotDispose),
            2 => Some(DisposalMethod::RestoreToBackgroundColor),
            3 => Some(DisposalMethod::RestoreToPrevious),
            _ => None,
        }
    }
}

/// Up to 256 RGB entries; lookups past the end read as black.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorTable {
    entries: Vec<Rgb<u8>>,
}

impl ColorTable {
    pub const MAX_ENTRIES: usize = 256;

    pub fn from_bytes(bytes: &[u8]) -> Self {
        let entries = bytes
            .chunks_exact(3)
            .take(Self::MAX_ENTRIES)
            .map(|rgb| Rgb([rgb[0], rgb[1], rgb[2]]))
            .collect();
        Self { entries }
    }

    /// Byte length of a table declared by the 3-bit size field of a packed byte.
    pub fn byte_len(size_field: u8) -> usize {
        3 * (1 << ((size_field & 0b00000111) + 1))
    }

    pub fn get(&self, index: u8) -> Rgb<u8> {
        self.entries.get(index as usize).copied().unwrap_or(Rgb([0, 0, 0]))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
