//! Scanline decompression.
//!
//! QuickDraw packs each scanline with a PackBits variant. A signed control
//! byte `n` is followed either by `n + 1` literal units (`n >= 0`) or by one
//! unit repeated `1 - n` times (`n < 0`). A unit is one byte, except for
//! 16-bit pixmaps where it is a two-byte word.

use crate::common::error::{Error, Result};

/// UnpackBits decompression of one scanline.
///
/// # Arguments
/// * `packed` - The packed scanline bytes
/// * `row_len` - The number of bytes the unpacked row must hold
/// * `unit` - 1 for bytes, 2 for 16-bit pixel words
///
/// Fails when the input ends before the row is full, or when a run would
/// write past `row_len`. The check happens before any byte is written.
pub fn unpack_bits(packed: &[u8], row_len: usize, unit: usize) -> Result<Vec<u8>> {
    if unit == 0 || unit > 4 {
        return Err(Error::ParseError(format!("Invalid PackBits unit size {}", unit)));
    }
    let mut output = Vec::with_capacity(row_len);
    let mut input_pos = 0;

    while output.len() < row_len {
        let Some(&code) = packed.get(input_pos) else {
            return Err(Error::ParseError(format!(
                "PackBits data exhausted: {} of {} bytes written",
                output.len(),
                row_len
            )));
        };
        input_pos += 1;
        let code = code as i8;

        if code < 0 {
            let count = (1 - code as i32) as usize;
            let step = count * unit;
            if input_pos + unit > packed.len() {
                return Err(Error::ParseError(
                    "Invalid PackBits data: missing repeated value".into(),
                ));
            }
            if output.len() + step > row_len {
                return Err(Error::ParseError(
                    "PackBits run exceeds the row length".into(),
                ));
            }
            let value = &packed[input_pos..input_pos + unit];
            input_pos += unit;
            for _ in 0..count {
                output.extend_from_slice(value);
            }
        } else {
            let step = (code as usize + 1) * unit;
            if input_pos + step > packed.len() {
                return Err(Error::ParseError(
                    "Invalid PackBits data: not enough literal bytes".into(),
                ));
            }
            if output.len() + step > row_len {
                return Err(Error::ParseError(
                    "PackBits literal exceeds the row length".into(),
                ));
            }
            output.extend_from_slice(&packed[input_pos..input_pos + step]);
            input_pos += step;
        }
    }

    Ok(output)
}

#[cfg(test)]
pub(crate) fn pack_bits(row: &[u8]) -> Vec<u8> {
    // Reference encoder: runs of 2..=128 identical bytes, literals of up to
    // 128 bytes. Never emits the -128 control byte.
    let mut out = Vec::new();
    let mut i = 0;
    while i < row.len() {
        let mut run = 1;
        while i + run < row.len() && run < 128 && row[i + run] == row[i] {
            run += 1;
        }
        if run >= 2 {
            out.push((1 - run as i32) as i8 as u8);
            out.push(row[i]);
            i += run;
            continue;
        }
        let start = i;
        while i < row.len() && i - start < 128 {
            if i + 1 < row.len() && row[i + 1] == row[i] {
                break;
            }
            i += 1;
        }
        if i == start {
            i += 1;
        }
        out.push((i - start - 1) as u8);
        out.extend_from_slice(&row[start..i]);
    }
    out
}
