use super::bit_reader::BitReader;

use log::debug;
use thiserror::Error;

const MAX_CODE_SIZE: u32 = 12;
const MAX_TABLE_SIZE: usize = 1 << MAX_CODE_SIZE;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LzwError {
    #[error("minimum code size {0} is outside of 2..=8")]
    InvalidMinimumCodeSize(u8),

    #[error("code {code} does not resolve, next free table slot is {next}")]
    InvalidCode { code: u16, next: u16 },
}

#[derive(Debug, Clone, Copy)]
struct TableEntry {
    // None for the single-index root entries
    prefix: Option<u16>,
    suffix: u8,
    // first index of the whole string, handed to entries built on top of this one
    first: u8,
    length: u16,
}

struct CodeTable {
    entries: Vec<TableEntry>,
}

impl CodeTable {
    fn new(clear_code: u16) -> Self {
        let mut entries = Vec::with_capacity(MAX_TABLE_SIZE);
        entries.extend((0..clear_code).map(|i| TableEntry {
            prefix: None,
            suffix: i as u8,
            first: i as u8,
            length: 1,
        }));
        // clear and end-of-information occupy slots but never resolve to indices
        let placeholder = TableEntry { prefix: None, suffix: 0, first: 0, length: 0 };
        entries.push(placeholder);
        entries.push(placeholder);

        Self { entries }
    }

    fn reset(&mut self, clear_code: u16) {
        self.entries.truncate(clear_code as usize + 2);
    }

    fn next_free(&self) -> u16 {
        self.entries.len() as u16
    }

    fn is_full(&self) -> bool {
        self.entries.len() >= MAX_TABLE_SIZE
    }

    fn get(&self, code: u16) -> Option<&TableEntry> {
        self.entries.get(code as usize).filter(|entry| entry.length > 0)
    }

    fn push(&mut self, prefix: u16, suffix: u8) -> Result<(), LzwError> {
        let next = self.next_free();
        let parent = *self.get(prefix).ok_or(LzwError::InvalidCode { code: prefix, next })?;
        self.entries.push(TableEntry {
            prefix: Some(prefix),
            suffix,
            first: parent.first,
            length: parent.length + 1,
        });
        Ok(())
    }

    /// Appends the string for `code` to `out` in display order by filling a reserved span
    /// from its end while walking the prefix chain.
    fn write_string(&self, code: u16, out: &mut Vec<u8>) -> Result<(), LzwError> {
        let next = self.next_free();
        let invalid = LzwError::InvalidCode { code, next };

        let entry = self.get(code).ok_or(invalid.clone())?;
        let start = out.len();
        out.resize(start + entry.length as usize, 0);

        let mut cursor = Some(code);
        let mut position = out.len();
        while let Some(current) = cursor {
            let entry = self.get(current).ok_or(invalid.clone())?;
            if position == start {
                // chain longer than the recorded length, the table is inconsistent
                return Err(invalid);
            }
            position -= 1;
            out[position] = entry.suffix;
            cursor = entry.prefix;
        }

        if position != start {
            return Err(invalid);
        }
        Ok(())
    }
}

/// Expands the concatenated sub-block payload of one image into palette indices.
///
/// A stream that runs out before its end-of-information code is treated as ended, so the
/// output may be shorter than the image. Decoding stops once `max_len` indices are out;
/// the caller pads to the image size.
pub fn lzw_decode(buf: &[u8], minimum_code_size: u8, max_len: usize) -> Result<Vec<u8>, LzwError> {
    if !(2..=8).contains(&minimum_code_size) {
        return Err(LzwError::InvalidMinimumCodeSize(minimum_code_size));
    }

    let minimum_code_size = u32::from(minimum_code_size);
    let clear_code: u16 = 1 << minimum_code_size;
    let end_of_information_code = clear_code + 1;

    let mut code_table = CodeTable::new(clear_code);
    let mut reader = BitReader::new(buf);
    let mut code_size = minimum_code_size + 1;
    let mut last_code: Option<u16> = None;

    let mut indicies: Vec<u8> = Vec::with_capacity(max_len.min(buf.len() * 2));

    loop {
        let Some(code) = reader.next(code_size) else {
            debug!("lzw stream ended without an end of information code");
            break;
        };

        if code == clear_code {
            code_table.reset(clear_code);
            code_size = minimum_code_size + 1;
            last_code = None;
            continue;
        }

        if code == end_of_information_code {
            break;
        }

        let start = indicies.len();
        let next = code_table.next_free();

        if code < next {
            // {CODE} is in the table, output it
            code_table.write_string(code, &mut indicies)?;
        } else if code == next && !code_table.is_full() {
            // {CODE} is the slot about to be created: {CODE-1}+K with K the first index of {CODE-1}
            let previous = last_code.ok_or(LzwError::InvalidCode { code, next })?;
            code_table.write_string(previous, &mut indicies)?;
            indicies.push(indicies[start]);
        } else {
            return Err(LzwError::InvalidCode { code, next });
        }

        if let Some(previous) = last_code {
            if !code_table.is_full() {
                // add {CODE-1}+K to the code table
                code_table.push(previous, indicies[start])?;

                if u32::from(code_table.next_free()) >= 1 << code_size && code_size < MAX_CODE_SIZE {
                    code_size += 1;
                }
            }
        }

        last_code = Some(code);

        if indicies.len() >= max_len {
            debug!("reached {max_len} indices, ignoring the rest of the lzw stream");
            break;
        }
    }

    indicies.truncate(max_len);
    Ok(indicies)
}
