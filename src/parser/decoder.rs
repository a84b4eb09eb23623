use super::byte_reader::ByteReader;
use super::compositor::{Compositor, DrawControl, Rect};
use super::interlace::deinterlace;
use super::lzw::{self, LzwError};
use super::{ColorTable, DisposalMethod};
use crate::frame::Frame;

use log::{debug, warn};
use thiserror::Error;

const EXTENSION_INTRODUCER: u8 = 0x21;
const IMAGE_DESCRIPTOR_LABEL: u8 = 0x2c;
const TRAILER_LABEL: u8 = 0x3b;

// Extension labels
const APPLICATION_EXTENSION: u8 = 0xff;
const COMMENT_EXTENSION: u8 = 0xfe;
const GRAPHIC_CONTROL_EXTENSION: u8 = 0xf9;
const PLAIN_TEXT_EXTENSION: u8 = 0x01;

/// Largest logical screen or image, in pixels, the decoder allocates buffers for.
pub const MAX_PIXELS: usize = 4096 * 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtensionType {
    Application,
    Comment,
    GraphicControl,
    PlainText,
    Unknown(u8),
}

impl From<u8> for ExtensionType {
    fn from(value: u8) -> Self {
        use ExtensionType::*;

        match value {
            APPLICATION_EXTENSION => Application,
            COMMENT_EXTENSION => Comment,
            GRAPHIC_CONTROL_EXTENSION => GraphicControl,
            PLAIN_TEXT_EXTENSION => PlainText,
            label => Unknown(label),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct GraphicControlExtension {
    disposal_method: DisposalMethod,
    transparent_color_flag: bool,

    // hundredths of a second, as stored
    delay_time: u16,
    transparent_color_index: u8,
}

impl GraphicControlExtension {
    fn draw_control(&self) -> DrawControl {
        DrawControl {
            disposal_method: self.disposal_method,
            transparent_index: self.transparent_color_flag.then_some(self.transparent_color_index),
            delay_ms: u32::from(self.delay_time) * 10,
        }
    }
}

#[derive(Debug)]
pub(crate) struct ImageDescriptor {
    pub(crate) rect: Rect,
    pub(crate) interlace_flag: bool,
    pub(crate) local_color_table_size: Option<usize>,
}

#[derive(Debug)]
pub(crate) struct GraphicBlock {
    pub(crate) extension: GraphicControlExtension,
    pub(crate) descriptor: ImageDescriptor,
    pub(crate) local_color_table: Option<ColorTable>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    V87a,
    V89a,
}

impl TryFrom<&[u8]> for Version {
    type Error = ParserError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        match value {
            b"87a" => Ok(Version::V87a),
            b"89a" => Ok(Version::V89a),
            version => Err(ParserError::UnsupportedVersion(String::from_utf8_lossy(version).into_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LogicalScreenDescriptor {
    pub screen_width: u16,
    pub screen_height: u16,
    pub global_color_table_size: Option<usize>,
    pub background_color_index: u8,
    pub pixel_aspect_ratio: u8,
}

#[derive(Debug)]
enum ParserState {
    ProcessMagic,
    ProcessLogicalScreenDescriptor,
    ProcessGlobalColorTable(usize),
    ProcessTrailer,

    DetermineNextBlock(GraphicControlExtension),
    ProcessExtension(u8, GraphicControlExtension),
    ProcessImageDescriptor(GraphicControlExtension),
    ProcessLocalColorTable(GraphicBlock),
    ProcessImageData(GraphicBlock),
    SkipUnknownBlock(u8, GraphicControlExtension),

    Done,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParserError {
    #[error("signature is invalid")]
    InvalidSignature,

    #[error("version {0} in the header is unsupported")]
    UnsupportedVersion(String),

    #[error("needed {needed} more bytes but only {remaining} remain")]
    InsufficientData { needed: usize, remaining: usize },

    #[error("logical screen has zero width or height")]
    EmptyLogicalScreen,

    #[error("logical screen of {width}x{height} exceeds {} pixels", MAX_PIXELS)]
    ScreenTooLarge { width: u16, height: u16 },

    #[error("image descriptor has zero width or height")]
    EmptyImage,

    #[error("image of {width}x{height} exceeds {} pixels", MAX_PIXELS)]
    ImageTooLarge { width: u16, height: u16 },

    #[error("image data could not be decompressed: {0}")]
    Lzw(#[from] LzwError),
}

/// Walks the GIF block grammar over an in-memory stream, compositing every image into a
/// [`Frame`].
///
/// A stream that ends early stops the walk without failing: the frames composited so far
/// are kept. An image whose data is corrupt is skipped and the walk carries on with the
/// next block. Only a bad header or logical screen fails [`Decoder::parse`].
#[derive(Debug)]
pub struct Decoder<'a> {
    reader: ByteReader<'a>,
    version: Option<Version>,
    logical_screen_descriptor: Option<LogicalScreenDescriptor>,
    global_color_table: Option<ColorTable>,
    compositor: Option<Compositor>,
    frames: Vec<Frame>,
    skipped_images: usize,
    truncated: bool,
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            reader: ByteReader::new(buf),
            version: None,
            logical_screen_descriptor: None,
            global_color_table: None,
            compositor: None,
            frames: Vec::new(),
            skipped_images: 0,
            truncated: false,
        }
    }

    pub fn parse(&mut self) -> Result<(), ParserError> {
        let mut state = ParserState::ProcessMagic;

        loop {
            debug!("begin parsing state {:?}", state);

            state = match self.process_next_state(state) {
                Ok(ParserState::Done) => break,
                Ok(next_state) => next_state,
                Err(ParserError::InsufficientData { needed, remaining }) => {
                    warn!(
                        "gif stream truncated (needed {needed} bytes, {remaining} left), keeping {} frames",
                        self.frames.len()
                    );
                    self.truncated = true;
                    break;
                }
                Err(err) => return Err(err),
            };
        }

        // the canvas and its snapshot only live for the duration of the decode
        self.compositor = None;
        Ok(())
    }

    pub fn version(&self) -> Option<Version> {
        self.version
    }

    pub fn logical_screen_descriptor(&self) -> Option<&LogicalScreenDescriptor> {
        self.logical_screen_descriptor.as_ref()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }

    /// Images dropped because their data was corrupt.
    pub fn skipped_images(&self) -> usize {
        self.skipped_images
    }

    /// Whether the stream ended before its trailer in the middle of a block.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    fn process_next_state(&mut self, next_state: ParserState) -> Result<ParserState, ParserError> {
        use ParserState::*;

        match next_state {
            ProcessMagic => {
                let magic = self.reader.read_bytes(6).map_err(|_| ParserError::InvalidSignature)?;
                if &magic[..3] != b"GIF" {
                    return Err(ParserError::InvalidSignature);
                }
                debug!("processed signature, got GIF");

                self.version = Some(Version::try_from(&magic[3..])?);
                debug!("processed version, got {:?}", self.version);

                Ok(ProcessLogicalScreenDescriptor)
            },
            ProcessLogicalScreenDescriptor => {
                let screen_width = self.reader.read_u16()?;
                let screen_height = self.reader.read_u16()?;

                let packed_fields = self.reader.read_byte()?;

                // packed field start
                let global_color_table_flag = packed_fields & 0b10000000 != 0;
                let global_color_table_size = global_color_table_flag.then(|| ColorTable::byte_len(packed_fields));
                // packed field end

                let background_color_index = self.reader.read_byte()?;
                let pixel_aspect_ratio = self.reader.read_byte()?;

                let descriptor = LogicalScreenDescriptor {
                    screen_width,
                    screen_height,
                    global_color_table_size,
                    background_color_index,
                    pixel_aspect_ratio,
                };
                debug!("processed logical screen descriptor, got: {:#?}", descriptor);
                self.logical_screen_descriptor = Some(descriptor);

                if screen_width == 0 || screen_height == 0 {
                    return Err(ParserError::EmptyLogicalScreen);
                }
                if usize::from(screen_width) * usize::from(screen_height) > MAX_PIXELS {
                    return Err(ParserError::ScreenTooLarge { width: screen_width, height: screen_height });
                }
                self.compositor = Some(Compositor::new(screen_width.into(), screen_height.into()));

                let next_state = match global_color_table_size {
                    Some(size) => ProcessGlobalColorTable(size),
                    None => DetermineNextBlock(GraphicControlExtension::default()),
                };

                Ok(next_state)
            },
            ProcessGlobalColorTable(size) => {
                let table = ColorTable::from_bytes(self.reader.read_bytes(size)?);
                debug!("processed global color table with {} entries", table.len());
                self.global_color_table = Some(table);

                Ok(DetermineNextBlock(GraphicControlExtension::default()))
            },
            ProcessTrailer => {
                Ok(Done)
            },
            DetermineNextBlock(graphic_control_extension) => {
                if self.reader.is_empty() {
                    debug!("stream ended without a trailer");
                    return Ok(Done);
                }

                match self.reader.read_byte()? {
                    // extension introducer means that a label follows determining what exact type
                    // of extension it is.
                    EXTENSION_INTRODUCER => Ok(ProcessExtension(self.reader.read_byte()?, graphic_control_extension)),
                    IMAGE_DESCRIPTOR_LABEL => Ok(ProcessImageDescriptor(graphic_control_extension)),
                    TRAILER_LABEL => Ok(ProcessTrailer),
                    label => Ok(SkipUnknownBlock(label, graphic_control_extension)),
                }
            },
            ProcessExtension(label, graphic_control_extension) => {
                self.process_extension(ExtensionType::from(label), graphic_control_extension)
            },
            ProcessImageDescriptor(graphic_control_extension) => {
                let left = self.reader.read_u16()?;
                let top = self.reader.read_u16()?;

                let width = self.reader.read_u16()?;
                let height = self.reader.read_u16()?;

                let packed_fields = self.reader.read_byte()?;

                let local_color_table_flag = packed_fields & 0b10000000 != 0;
                let interlace_flag = packed_fields & 0b01000000 != 0;
                let local_color_table_size = local_color_table_flag.then(|| ColorTable::byte_len(packed_fields));

                let graphic_block = GraphicBlock {
                    extension: graphic_control_extension,
                    descriptor: ImageDescriptor {
                        rect: Rect { left, top, width, height },
                        interlace_flag,
                        local_color_table_size,
                    },
                    local_color_table: None,
                };
                debug!("processed image descriptor, got: {:?}", graphic_block.descriptor);

                let next_state = if local_color_table_flag {
                    ProcessLocalColorTable(graphic_block)
                } else {
                    ProcessImageData(graphic_block)
                };

                Ok(next_state)
            },
            ProcessLocalColorTable(mut graphic_block) => {
                let size = graphic_block.descriptor.local_color_table_size.unwrap_or_default();

                graphic_block.local_color_table = Some(ColorTable::from_bytes(self.reader.read_bytes(size)?));

                Ok(ProcessImageData(graphic_block))
            },
            ProcessImageData(graphic_block) => {
                let lzw_code_size = self.reader.read_byte()?;
                let data_stream = self.reader.read_data_sub_blocks()?;

                match self.composite(&graphic_block, &data_stream, lzw_code_size) {
                    Ok(frame) => self.frames.push(frame),
                    Err(err) => {
                        warn!("skipping image {:?}: {err}", graphic_block.descriptor.rect);
                        self.skipped_images += 1;
                    }
                }

                // the graphic control extension only ever applies to one image
                Ok(DetermineNextBlock(GraphicControlExtension::default()))
            },
            SkipUnknownBlock(label, graphic_control_extension) => {
                debug!("skipping block with unknown label 0x{label:02x}");
                self.reader.skip_data_sub_blocks()?;

                Ok(DetermineNextBlock(graphic_control_extension))
            },
            Done => Ok(Done),
        }
    }

    fn process_extension(
        &mut self,
        label: ExtensionType,
        graphic_control_extension: GraphicControlExtension,
    ) -> Result<ParserState, ParserError> {
        use ExtensionType::*;

        debug!("processing extension type: {:?}", label);
        match label {
            GraphicControl => {
                let block_size = self.reader.read_byte()?;
                let mut extra_bytes = usize::from(block_size);
                let mut graphic_control_extension = graphic_control_extension;

                if block_size >= 4 {
                    let packed_fields = self.reader.read_byte()?;
                    // packed fields definition
                    // XXXYYYZW
                    // XXX = reserved, not needed
                    // YYY = disposal method, indicates what to do with graphic after displaying
                    // Z = user input flag, not needed
                    // W = transparent color flag

                    let disposal_bits = (packed_fields >> 2) & 0b00000111;
                    let disposal_method = DisposalMethod::from_u8(disposal_bits).unwrap_or_else(|| {
                        debug!("reserved disposal method {disposal_bits}, leaving canvas as is");
                        DisposalMethod::Unspecified
                    });
                    let transparent_color_flag = packed_fields & 0b00000001 != 0;

                    let delay_time = self.reader.read_u16()?;
                    let transparent_color_index = self.reader.read_byte()?;

                    graphic_control_extension = GraphicControlExtension {
                        disposal_method,
                        transparent_color_flag,
                        delay_time,
                        transparent_color_index,
                    };
                    extra_bytes -= 4;

                    debug!("processed GraphicControlExtension: {:#?}", graphic_control_extension);
                }

                self.reader.skip(extra_bytes)?;
                self.reader.skip_data_sub_blocks()?;

                Ok(ParserState::DetermineNextBlock(graphic_control_extension))
            },
            Application | Comment | PlainText | Unknown(_) => {
                self.reader.skip_data_sub_blocks()?;

                Ok(ParserState::DetermineNextBlock(graphic_control_extension))
            },
        }
    }

    fn composite(&mut self, graphic_block: &GraphicBlock, data_stream: &[u8], lzw_code_size: u8) -> Result<Frame, ParserError> {
        let descriptor = &graphic_block.descriptor;
        let width = usize::from(descriptor.rect.width);
        let height = usize::from(descriptor.rect.height);
        if width == 0 || height == 0 {
            return Err(ParserError::EmptyImage);
        }
        if width * height > MAX_PIXELS {
            return Err(ParserError::ImageTooLarge { width: descriptor.rect.width, height: descriptor.rect.height });
        }

        let mut indicies = lzw::lzw_decode(data_stream, lzw_code_size, width * height)?;
        if indicies.len() != width * height {
            debug!("image has {} indices, expected {}", indicies.len(), width * height);
            indicies.resize(width * height, 0);
        }

        if descriptor.interlace_flag {
            indicies = deinterlace(&indicies, width, height);
        }

        let empty = ColorTable::default();
        let palette = graphic_block
            .local_color_table
            .as_ref()
            .or(self.global_color_table.as_ref())
            .unwrap_or(&empty);

        let compositor = self.compositor.as_mut().ok_or(ParserError::EmptyLogicalScreen)?;
        Ok(compositor.draw(descriptor.rect, &indicies, palette, &graphic_block.extension.draw_control()))
    }
}

/// Decodes a whole GIF stream into composited frames.
pub fn decode(buf: &[u8]) -> Result<Vec<Frame>, ParserError> {
    let mut decoder = Decoder::new(buf);
    decoder.parse()?;
    Ok(decoder.into_frames())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::interlace::interlace;
    use crate::parser::test_support::{GifBuilder, ImageBlock, PALETTE};
    use image::Rgba;

    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
    const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

    fn two_frame_gif() -> Vec<u8> {
        GifBuilder::new(2, 2, Some(&PALETTE))
            .graphic_control(0, None, 5)
            .image(ImageBlock::new(0, 0, 2, 2, &[1, 1, 1, 1]))
            .comment(b"ignored")
            .image(ImageBlock::new(1, 1, 1, 1, &[3]))
            .trailer()
            .build()
    }

    #[test]
    fn decodes_frames_with_delays() {
        let frames = decode(&two_frame_gif()).unwrap();
        assert_eq!(frames.len(), 2);

        assert_eq!(frames[0].delay_ms(), 50);
        // the extension was consumed by the first image
        assert_eq!(frames[1].delay_ms(), crate::frame::DEFAULT_DELAY_MS);

        assert_eq!(*frames[1].image().get_pixel(0, 0), RED);
        assert_eq!(*frames[1].image().get_pixel(1, 1), BLUE);
    }

    #[test]
    fn accepts_both_versions() {
        let gif = GifBuilder::with_magic(b"GIF87a", 1, 1, Some(&PALETTE))
            .image(ImageBlock::new(0, 0, 1, 1, &[2]))
            .trailer()
            .build();
        let mut decoder = Decoder::new(&gif);
        decoder.parse().unwrap();
        assert_eq!(decoder.version(), Some(Version::V87a));
        assert_eq!(*decoder.frames()[0].image().get_pixel(0, 0), GREEN);
    }

    #[test]
    fn rejects_bad_magic() {
        let gif = GifBuilder::with_magic(b"GIF90a", 1, 1, None).trailer().build();
        assert_eq!(decode(&gif), Err(ParserError::UnsupportedVersion("90a".into())));

        let png = b"\x89PNG\r\n\x1a\n";
        assert_eq!(decode(png), Err(ParserError::InvalidSignature));
        assert_eq!(decode(b"GIF"), Err(ParserError::InvalidSignature));
    }

    #[test]
    fn rejects_empty_logical_screen() {
        let gif = GifBuilder::new(0, 4, None).trailer().build();
        assert_eq!(decode(&gif), Err(ParserError::EmptyLogicalScreen));
    }

    #[test]
    fn transparency_and_local_color_table() {
        let local = [10, 20, 30, 40, 50, 60];
        let mut image = ImageBlock::new(0, 0, 2, 1, &[0, 1]);
        image.local_color_table = Some(&local);
        image.minimum_code_size = 2;

        let gif = GifBuilder::new(2, 1, Some(&PALETTE))
            .image(ImageBlock::new(0, 0, 2, 1, &[3, 3]))
            .graphic_control(1, Some(1), 0)
            .image(image)
            .trailer()
            .build();

        let frames = decode(&gif).unwrap();
        assert_eq!(*frames[1].image().get_pixel(0, 0), Rgba([10, 20, 30, 255]));
        assert_eq!(*frames[1].image().get_pixel(1, 0), BLUE);
    }

    #[test]
    fn deinterlaces_images() {
        let rows: Vec<u8> = (0..9).map(|row| row % 4).collect();
        let stored = interlace(&rows, 1, 9);
        let mut image = ImageBlock::new(0, 0, 1, 9, &stored);
        image.interlaced = true;

        let gif = GifBuilder::new(1, 9, Some(&PALETTE)).image(image).trailer().build();
        let frames = decode(&gif).unwrap();

        let expected = [BLACK, RED, GREEN, BLUE];
        for (row, index) in rows.iter().enumerate() {
            assert_eq!(*frames[0].image().get_pixel(0, row as u32), expected[*index as usize]);
        }
    }

    #[test]
    fn short_and_long_index_streams_are_fitted() {
        let gif = GifBuilder::new(2, 2, Some(&PALETTE))
            .image(ImageBlock::new(0, 0, 2, 2, &[3]))
            .image(ImageBlock::new(0, 0, 1, 1, &[2, 2, 2, 2, 2]))
            .trailer()
            .build();

        let frames = decode(&gif).unwrap();
        assert_eq!(*frames[0].image().get_pixel(0, 0), BLUE);
        // padded with index 0
        assert_eq!(*frames[0].image().get_pixel(1, 1), BLACK);
        assert_eq!(*frames[1].image().get_pixel(0, 0), GREEN);
        assert_eq!(*frames[1].image().get_pixel(1, 0), BLACK);
    }

    #[test]
    fn restore_to_background_clears_rectangle_in_next_frame() {
        let gif = GifBuilder::new(3, 3, Some(&PALETTE))
            .image(ImageBlock::new(0, 0, 3, 3, &[1; 9]))
            .graphic_control(2, None, 0)
            .image(ImageBlock::new(1, 1, 2, 1, &[2, 2]))
            // fully transparent 1x1 image so nothing but the disposal changes
            .graphic_control(0, Some(0), 0)
            .image(ImageBlock::new(0, 0, 1, 1, &[0]))
            .trailer()
            .build();

        let frames = decode(&gif).unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(*frames[1].image().get_pixel(1, 1), GREEN);

        for (x, y, pixel) in frames[2].image().enumerate_pixels() {
            let inside = y == 1 && (1..3).contains(&x);
            assert_eq!(*pixel, if inside { CLEAR } else { RED }, "pixel {x},{y}");
        }
    }

    #[test]
    fn restore_to_previous_brings_back_earlier_canvas() {
        let gif = GifBuilder::new(2, 2, Some(&PALETTE))
            .image(ImageBlock::new(0, 0, 2, 2, &[0, 1, 2, 3]))
            .graphic_control(3, None, 0)
            .image(ImageBlock::new(0, 0, 2, 2, &[2, 2, 2, 2]))
            .graphic_control(0, Some(0), 0)
            .image(ImageBlock::new(1, 1, 1, 1, &[0]))
            .trailer()
            .build();

        let frames = decode(&gif).unwrap();
        assert_eq!(frames.len(), 3);
        assert!(frames[1].image().pixels().all(|pixel| *pixel == GREEN));
        assert_eq!(frames[2].image(), frames[0].image());
    }

    #[test]
    fn corrupt_image_is_skipped() {
        let gif = GifBuilder::new(1, 1, Some(&PALETTE))
            .graphic_control(0, None, 7)
            // minimum code size 12 is invalid, data is consumed anyway
            .raw(&[0x2c, 0, 0, 0, 0, 1, 0, 1, 0, 0, 12, 2, 0xff, 0xff, 0])
            .image(ImageBlock::new(0, 0, 1, 1, &[1]))
            // zero sized image
            .raw(&[0x2c, 0, 0, 0, 0, 0, 0, 1, 0, 0, 2, 1, 0x44, 0])
            .image(ImageBlock::new(0, 0, 1, 1, &[2]))
            .trailer()
            .build();

        let mut decoder = Decoder::new(&gif);
        decoder.parse().unwrap();
        assert_eq!(decoder.skipped_images(), 2);

        let frames = decoder.frames();
        assert_eq!(frames.len(), 2);
        // the skipped image still consumed its graphic control extension
        assert_eq!(frames[0].delay_ms(), crate::frame::DEFAULT_DELAY_MS);
        assert_eq!(*frames[0].image().get_pixel(0, 0), RED);
        assert_eq!(*frames[1].image().get_pixel(0, 0), GREEN);
    }

    #[test]
    fn oversized_image_is_skipped_without_allocating() {
        let gif = GifBuilder::new(1, 1, Some(&PALETTE))
            // 65535x65535 descriptor with a few bytes of data
            .raw(&[0x2c, 0, 0, 0, 0, 0xff, 0xff, 0xff, 0xff, 0, 2, 2, 0x44, 0x01, 0])
            .image(ImageBlock::new(0, 0, 1, 1, &[3]))
            .trailer()
            .build();

        let mut decoder = Decoder::new(&gif);
        decoder.parse().unwrap();
        assert_eq!(decoder.skipped_images(), 1);
        assert_eq!(decoder.frames().len(), 1);
        assert_eq!(*decoder.frames()[0].image().get_pixel(0, 0), BLUE);
    }

    #[test]
    fn image_larger_than_screen_is_clipped() {
        let indicies: Vec<u8> = (0..64 * 64).map(|i| (i % 4) as u8).collect();
        let gif = GifBuilder::new(2, 1, Some(&PALETTE))
            .image(ImageBlock::new(1, 0, 64, 64, &indicies))
            .trailer()
            .build();

        let frames = decode(&gif).unwrap();
        assert_eq!((frames[0].width(), frames[0].height()), (2, 1));
        assert_eq!(*frames[0].image().get_pixel(0, 0), CLEAR);
        assert_eq!(*frames[0].image().get_pixel(1, 0), BLACK);
    }

    #[test]
    fn rejects_oversized_logical_screen() {
        let gif = GifBuilder::new(u16::MAX, u16::MAX, None).trailer().build();
        assert_eq!(
            decode(&gif),
            Err(ParserError::ScreenTooLarge { width: u16::MAX, height: u16::MAX })
        );
    }

    #[test]
    fn unknown_blocks_and_extensions_are_skipped() {
        let gif = GifBuilder::new(1, 1, Some(&PALETTE))
            // application extension with payload
            .raw(&[0x21, 0xff, 11])
            .raw(b"NETSCAPE2.0")
            .raw(&[3, 1, 0, 0, 0])
            // unknown introducer followed by sub-blocks
            .raw(&[0x99, 2, 7, 7, 0])
            .image(ImageBlock::new(0, 0, 1, 1, &[3]))
            .trailer()
            .build();

        let frames = decode(&gif).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(*frames[0].image().get_pixel(0, 0), BLUE);
    }

    #[test]
    fn graphic_control_with_extra_bytes() {
        let gif = GifBuilder::new(1, 1, Some(&PALETTE))
            .raw(&[0x21, 0xf9, 6, 0, 3, 0, 0, 0xaa, 0xbb, 0])
            .image(ImageBlock::new(0, 0, 1, 1, &[1]))
            .trailer()
            .build();

        let frames = decode(&gif).unwrap();
        assert_eq!(frames[0].delay_ms(), 30);
    }

    #[test]
    fn missing_trailer_ends_cleanly() {
        let gif = GifBuilder::new(1, 1, Some(&PALETTE))
            .image(ImageBlock::new(0, 0, 1, 1, &[1]))
            .build();

        let mut decoder = Decoder::new(&gif);
        decoder.parse().unwrap();
        assert_eq!(decoder.frames().len(), 1);
        assert!(!decoder.is_truncated());
    }

    #[test]
    fn truncated_stream_keeps_completed_frames() {
        let mut builder = GifBuilder::new(4, 4, Some(&PALETTE));
        let mut image_ends = Vec::new();
        for i in 0..4u8 {
            let indicies = [i % 4; 16];
            builder = builder
                .graphic_control(1, None, 2)
                .image(ImageBlock::new(0, 0, 4, 4, &indicies));
            image_ends.push(builder.len());
        }
        let gif = builder.trailer().build();

        // every cut after the header must decode without panicking
        for cut in 6..gif.len() {
            let frames = decode(&gif[..cut]).unwrap_or_default();
            let complete = image_ends.iter().filter(|end| **end <= cut).count();
            assert!(frames.len() <= complete, "cut {cut}: {} frames, {complete} complete", frames.len());
        }
        assert_eq!(decode(&gif).unwrap().len(), 4);
    }
}
