//! Assembles GIF streams block by block for decoder tests.

use weezl::{encode::Encoder, BitOrder};

pub struct GifBuilder {
    bytes: Vec<u8>,
}

pub struct ImageBlock<'a> {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
    pub interlaced: bool,
    pub local_color_table: Option<&'a [u8]>,
    pub minimum_code_size: u8,
    /// Indices in storage order, so already interlaced when `interlaced` is set.
    pub indicies: &'a [u8],
}

impl<'a> ImageBlock<'a> {
    pub fn new(left: u16, top: u16, width: u16, height: u16, indicies: &'a [u8]) -> Self {
        Self {
            left,
            top,
            width,
            height,
            interlaced: false,
            local_color_table: None,
            minimum_code_size: 2,
            indicies,
        }
    }
}

/// Four colors: 0 black, 1 red, 2 green, 3 blue.
pub const PALETTE: [u8; 12] = [0, 0, 0, 255, 0, 0, 0, 255, 0, 0, 0, 255];

impl GifBuilder {
    pub fn new(width: u16, height: u16, global_color_table: Option<&[u8]>) -> Self {
        Self::with_magic(b"GIF89a", width, height, global_color_table)
    }

    pub fn with_magic(magic: &[u8], width: u16, height: u16, global_color_table: Option<&[u8]>) -> Self {
        let mut bytes = magic.to_vec();
        bytes.extend_from_slice(&width.to_le_bytes());
        bytes.extend_from_slice(&height.to_le_bytes());
        bytes.push(match global_color_table {
            Some(table) => 0x80 | size_field(table),
            None => 0,
        });
        // background color index, pixel aspect ratio
        bytes.extend_from_slice(&[0, 0]);
        if let Some(table) = global_color_table {
            bytes.extend_from_slice(table);
        }
        Self { bytes }
    }

    pub fn graphic_control(mut self, disposal: u8, transparent_index: Option<u8>, delay_cs: u16) -> Self {
        let packed = (disposal << 2) | u8::from(transparent_index.is_some());
        self.bytes.extend_from_slice(&[0x21, 0xf9, 4, packed]);
        self.bytes.extend_from_slice(&delay_cs.to_le_bytes());
        self.bytes.extend_from_slice(&[transparent_index.unwrap_or(0), 0]);
        self
    }

    pub fn comment(mut self, text: &[u8]) -> Self {
        self.bytes.extend_from_slice(&[0x21, 0xfe]);
        self.sub_blocks(text);
        self
    }

    pub fn image(mut self, image: ImageBlock<'_>) -> Self {
        self.bytes.push(0x2c);
        for field in [image.left, image.top, image.width, image.height] {
            self.bytes.extend_from_slice(&field.to_le_bytes());
        }

        let mut packed = 0;
        if image.interlaced {
            packed |= 0x40;
        }
        if let Some(table) = image.local_color_table {
            packed |= 0x80 | size_field(table);
        }
        self.bytes.push(packed);
        if let Some(table) = image.local_color_table {
            self.bytes.extend_from_slice(table);
        }

        self.bytes.push(image.minimum_code_size);
        let data = Encoder::new(BitOrder::Lsb, image.minimum_code_size)
            .encode(image.indicies)
            .expect("reference encoder should accept the indices");
        self.sub_blocks(&data);
        self
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn trailer(mut self) -> Self {
        self.bytes.push(0x3b);
        self
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }

    fn sub_blocks(&mut self, data: &[u8]) {
        // short blocks so multi-block payloads get exercised
        for chunk in data.chunks(100) {
            self.bytes.push(chunk.len() as u8);
            self.bytes.extend_from_slice(chunk);
        }
        self.bytes.push(0);
    }
}

fn size_field(table: &[u8]) -> u8 {
    let entries = table.len() / 3;
    (0..8u8).find(|n| 1usize << (n + 1) >= entries).unwrap_or(7)
}
