//! Multi-byte unsigned integers (`mb_u_int32`): seven value bits per byte,
//! most significant group first, continuation bit set on every byte but the
//! last.

use crate::error::{Result, WbxmlError};

const CONTINUATION: u8 = 0x80;
const VALUE_BITS: u8 = 0x7F;
const MAX_BYTES: usize = 5;

/// Appends the encoding of `value` to `out`.
pub fn write_mb_u32(out: &mut Vec<u8>, mut value: u32) {
    let mut groups = [0u8; MAX_BYTES];
    let mut count = 0;
    loop {
        groups[count] = (value as u8) & VALUE_BITS;
        count += 1;
        value >>= 7;
        if value == 0 {
            break;
        }
    }
    for i in (0..count).rev() {
        let continuation = if i > 0 { CONTINUATION } else { 0 };
        out.push(groups[i] | continuation);
    }
}

/// Number of bytes [`write_mb_u32`] emits for `value`.
pub fn encoded_len(value: u32) -> usize {
    let mut len = 1;
    let mut rest = value >> 7;
    while rest != 0 {
        len += 1;
        rest >>= 7;
    }
    len
}

/// Reads an integer starting at `*pos`, advancing `*pos` past it.
pub fn read_mb_u32(input: &[u8], pos: &mut usize) -> Result<u32> {
    let start = *pos;
    let mut value: u32 = 0;
    for _ in 0..MAX_BYTES {
        let byte = *input.get(*pos).ok_or(WbxmlError::Truncated(*pos))?;
        *pos += 1;
        if value > (u32::MAX >> 7) {
            return Err(WbxmlError::IntegerOverflow(start));
        }
        value = (value << 7) | u32::from(byte & VALUE_BITS);
        if byte & CONTINUATION == 0 {
            return Ok(value);
        }
    }
    Err(WbxmlError::IntegerOverflow(start))
}
