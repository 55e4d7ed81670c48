//! Binary dense matrix cache files.
//!
//! Layout (all little-endian):
//! - bytes 0..4: number of rows (`u32`)
//! - bytes 4..8: number of columns (`u32`)
//! - bytes 8..12: byte offset of the payload (`u32`)
//! - payload: `rows * cols` row-major `f64` values
use super::DenseMatrix;
use crate::error::{LcaError, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

const HEADER_LEN: usize = 12;
/// Payload offset used when writing; keeps the values 8-byte aligned.
const PAYLOAD_OFFSET: u32 = 16;

pub fn write(path: &Path, matrix: &DenseMatrix) -> Result<()> {
    use super::Matrix;
    let rows = u32::try_from(matrix.rows())
        .map_err(|_| LcaError::MatrixFormat("too many rows".to_string()))?;
    let cols = u32::try_from(matrix.columns())
        .map_err(|_| LcaError::MatrixFormat("too many columns".to_string()))?;

    let mut buf = Vec::with_capacity(PAYLOAD_OFFSET as usize + matrix.data().len() * 8);
    buf.extend_from_slice(&rows.to_le_bytes());
    buf.extend_from_slice(&cols.to_le_bytes());
    buf.extend_from_slice(&PAYLOAD_OFFSET.to_le_bytes());
    buf.resize(PAYLOAD_OFFSET as usize, 0);
    for v in matrix.data() {
        buf.extend_from_slice(&v.to_le_bytes());
    }

    let mut file = fs::File::create(path)?;
    file.write_all(&buf)?;
    Ok(())
}

pub fn read(path: &Path) -> Result<DenseMatrix> {
    let bytes = fs::read(path)?;
    decode(&bytes)
}

/// Decodes the header and copies the payload straight into the matrix buffer.
pub fn decode(bytes: &[u8]) -> Result<DenseMatrix> {
    if bytes.len() < HEADER_LEN {
        return Err(LcaError::MatrixFormat(format!("file too short for header: {} bytes", bytes.len())));
    }
    let rows = read_u32(bytes, 0) as usize;
    let cols = read_u32(bytes, 4) as usize;
    let offset = read_u32(bytes, 8) as usize;
    if offset < HEADER_LEN {
        return Err(LcaError::MatrixFormat(format!("payload offset {} overlaps the header", offset)));
    }

    let len = rows
        .checked_mul(cols)
        .and_then(|n| n.checked_mul(8))
        .ok_or_else(|| LcaError::MatrixFormat("matrix size overflows".to_string()))?;
    let payload = offset
        .checked_add(len)
        .and_then(|end| bytes.get(offset..end))
        .ok_or_else(|| LcaError::MatrixFormat(format!("expected {} payload bytes at offset {}", len, offset)))?;

    let data: Vec<f64> = payload
        .chunks_exact(8)
        .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
        .collect();
    DenseMatrix::from_row_major(rows, cols, data)
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}
