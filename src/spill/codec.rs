//! Binary page frames
//!
//! ```text
//! +------------------+
//! | Frame Length     | (u32 LE, whole frame)
//! +------------------+
//! | Tuple Count      | (u32 LE)
//! +------------------+
//! | Tuples           | (fields in schema order)
//! +------------------+
//! | Checksum         | (u32 LE, CRC32 of all preceding bytes)
//! +------------------+
//! ```
//!
//! Field encodings: INT as i64, REAL as f64 bits, TEXT as u32 length plus
//! UTF-8 bytes.

use std::io::{self, Cursor, Read};

use crate::executor::{ExecError, ExecResult};
use crate::page::Page;
use crate::tuple::{DataType, Schema, Tuple, Value};

/// Length prefix + tuple count + checksum
pub const MIN_FRAME_SIZE: usize = 4 + 4 + 4;

/// Encodes a page into a complete frame.
///
/// Every tuple must match the schema's arity and types.
pub fn encode_page(page: &Page, schema: &Schema) -> ExecResult<Vec<u8>> {
    let mut frame = Vec::with_capacity(MIN_FRAME_SIZE + page.len() * schema.tuple_size());

    // Length is patched in once the body is known
    frame.extend_from_slice(&0u32.to_le_bytes());
    frame.extend_from_slice(&(page.len() as u32).to_le_bytes());

    for tuple in page.iter() {
        encode_tuple(&mut frame, tuple, schema)?;
    }

    let frame_len = (frame.len() + 4) as u32;
    frame[0..4].copy_from_slice(&frame_len.to_le_bytes());

    let checksum = crc32fast::hash(&frame);
    frame.extend_from_slice(&checksum.to_le_bytes());
    Ok(frame)
}

fn encode_tuple(buf: &mut Vec<u8>, tuple: &Tuple, schema: &Schema) -> ExecResult<()> {
    if tuple.arity() != schema.len() {
        return Err(ExecError::schema_mismatch(format!(
            "Tuple {} has arity {}, schema expects {}",
            tuple,
            tuple.arity(),
            schema.len()
        )));
    }

    for (value, attribute) in tuple.values().iter().zip(schema.attributes()) {
        match (value, attribute.data_type) {
            (Value::Int(v), DataType::Int) => buf.extend_from_slice(&v.to_le_bytes()),
            (Value::Real(v), DataType::Real) => buf.extend_from_slice(&v.to_bits().to_le_bytes()),
            (Value::Text(s), DataType::Text) => {
                buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
                buf.extend_from_slice(s.as_bytes());
            }
            (value, expected) => {
                return Err(ExecError::schema_mismatch(format!(
                    "Attribute '{}' expects {}, found {} value {}",
                    attribute.name,
                    expected,
                    value.data_type(),
                    value
                )))
            }
        }
    }
    Ok(())
}

/// Decodes one complete frame.
///
/// Verifies the length, the checksum and that the tuple count does not
/// exceed `capacity`. Any failure is AERO_PAGE_CORRUPTION.
pub fn decode_frame(frame: &[u8], schema: &Schema, capacity: usize) -> ExecResult<Page> {
    if frame.len() < MIN_FRAME_SIZE {
        return Err(ExecError::malformed_page(format!(
            "Frame too short: {} bytes",
            frame.len()
        )));
    }

    let frame_len = u32::from_le_bytes([frame[0], frame[1], frame[2], frame[3]]) as usize;
    if frame_len != frame.len() {
        return Err(ExecError::malformed_page(format!(
            "Frame length {} does not match {} bytes read",
            frame_len,
            frame.len()
        )));
    }

    let checksum_offset = frame_len - 4;
    let stored = u32::from_le_bytes([
        frame[checksum_offset],
        frame[checksum_offset + 1],
        frame[checksum_offset + 2],
        frame[checksum_offset + 3],
    ]);
    let computed = crc32fast::hash(&frame[..checksum_offset]);
    if computed != stored {
        return Err(ExecError::malformed_page(format!(
            "Checksum mismatch: computed {:08x}, stored {:08x}",
            computed, stored
        )));
    }

    let count = u32::from_le_bytes([frame[4], frame[5], frame[6], frame[7]]) as usize;
    if count > capacity {
        return Err(ExecError::malformed_page(format!(
            "Frame holds {} tuples, page capacity is {}",
            count, capacity
        )));
    }

    let mut cursor = Cursor::new(&frame[8..checksum_offset]);
    let mut page = Page::new(capacity);
    for _ in 0..count {
        let tuple = decode_tuple(&mut cursor, schema)
            .map_err(|e| ExecError::malformed_page(format!("Truncated tuple: {}", e)))?;
        page.push(tuple)?;
    }

    if cursor.position() as usize != checksum_offset - 8 {
        return Err(ExecError::malformed_page(format!(
            "{} trailing bytes after {} tuples",
            checksum_offset - 8 - cursor.position() as usize,
            count
        )));
    }

    Ok(page)
}

fn decode_tuple<R: Read>(reader: &mut R, schema: &Schema) -> io::Result<Tuple> {
    let mut values = Vec::with_capacity(schema.len());
    for attribute in schema.attributes() {
        let value = match attribute.data_type {
            DataType::Int => Value::Int(i64::from_le_bytes(read_array(reader)?)),
            DataType::Real => Value::Real(f64::from_bits(u64::from_le_bytes(read_array(reader)?))),
            DataType::Text => {
                let len = u32::from_le_bytes(read_array(reader)?) as usize;
                let mut buf = vec![0u8; len];
                reader.read_exact(&mut buf)?;
                let text = String::from_utf8(buf).map_err(|e| {
                    io::Error::new(io::ErrorKind::InvalidData, format!("Invalid UTF-8: {}", e))
                })?;
                Value::Text(text)
            }
        };
        values.push(value);
    }
    Ok(Tuple::new(values))
}

fn read_array<R: Read, const N: usize>(reader: &mut R) -> io::Result<[u8; N]> {
    let mut buf = [0u8; N];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}
