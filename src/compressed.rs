//! Compressed integer wire format as defined in ECMA-335 §II.23.2.
//!
//! Heap entry lengths and several signature values are stored as
//! variable-width integers whose first byte carries the width in its top
//! bits:
//!
//! - Values 0..=0x7F: 1 byte (`0xxxxxxx`)
//! - Values 0x80..=0x3FFF: 2 bytes (`10xxxxxx xxxxxxxx`)
//! - Values 0x4000..=0x1FFF_FFFF: 4 bytes (`110xxxxx` + 3 bytes)
//!
//! Signed values use the same three widths, rotated left by one bit so the
//! sign lands in the LSB (§II.23.2 "compressed signed integers").
//!
//! The codec is allocation free and advances the caller's cursor only when
//! a read or write succeeds.

use crate::{Result, Error::OutOfBounds};

/// Policy for the reserved bits of the 4-byte form's first byte.
///
/// The standard requires `110xxxxx` (first byte in 0xC0..=0xDF), but
/// real-world writers have been seen emitting the reserved patterns
/// 0xE0..=0xFF. [`CompressedMode::AcceptErroneous`] masks the reserved bits
/// off instead of rejecting such input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressedMode {
    /// The 4-byte form's first byte must be in 0xC0..=0xDF.
    Strict,
    /// Ignore the reserved top bits of the 4-byte form.
    #[default]
    AcceptErroneous,
}

/// Read a compressed unsigned integer, tolerating reserved 4-byte prefixes.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the buffer ends inside the value.
pub fn read_compressed_u32(data: &[u8], offset: &mut usize) -> Result<u32> {
    read_compressed_u32_mode(data, offset, CompressedMode::AcceptErroneous)
}

/// Read a compressed unsigned integer under the given prefix policy.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the buffer ends inside the value,
/// or [`crate::Error::Malformed`] in [`CompressedMode::Strict`] when the
/// 4-byte form carries a reserved first byte.
pub fn read_compressed_u32_mode(
    data: &[u8],
    offset: &mut usize,
    mode: CompressedMode,
) -> Result<u32> {
    let mut cursor = *offset;
    let first_byte = crate::io::read_le_at::<u8>(data, &mut cursor)?;

    // 1-byte encoding: 0xxxxxxx
    if (first_byte & 0x80) == 0 {
        *offset = cursor;
        return Ok(u32::from(first_byte));
    }

    // 2-byte encoding: 10xxxxxx xxxxxxxx
    if (first_byte & 0xC0) == 0x80 {
        let second_byte = crate::io::read_le_at::<u8>(data, &mut cursor)?;
        *offset = cursor;
        return Ok(((u32::from(first_byte) & 0x3F) << 8) | u32::from(second_byte));
    }

    // 4-byte encoding: 110xxxxx xxxxxxxx xxxxxxxx xxxxxxxx
    if mode == CompressedMode::Strict && (first_byte & 0xE0) != 0xC0 {
        return Err(malformed_error!(
            "Invalid compressed uint prefix - {:#04x}",
            first_byte
        ));
    }

    let b1 = u32::from(crate::io::read_le_at::<u8>(data, &mut cursor)?);
    let b2 = u32::from(crate::io::read_le_at::<u8>(data, &mut cursor)?);
    let b3 = u32::from(crate::io::read_le_at::<u8>(data, &mut cursor)?);
    *offset = cursor;

    Ok(((u32::from(first_byte) & 0x1F) << 24) | (b1 << 16) | (b2 << 8) | b3)
}

/// Bounds-checked variant of [`read_compressed_u32`].
///
/// Returns `None` without advancing the cursor when the buffer does not
/// contain enough remaining bytes for the width announced by the first byte.
#[must_use]
pub fn try_read_compressed_u32(data: &[u8], offset: &mut usize) -> Option<u32> {
    let mut cursor = *offset;
    match read_compressed_u32(data, &mut cursor) {
        Ok(value) => {
            *offset = cursor;
            Some(value)
        }
        Err(_) => None,
    }
}

/// Read a compressed signed integer.
///
/// The encoded value is the two's-complement number rotated left by one bit
/// within the width of its bucket (7, 14 or 29 bits), so the original sign
/// bit is the encoded LSB.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the buffer ends inside the value.
pub fn read_compressed_i32(data: &[u8], offset: &mut usize) -> Result<i32> {
    let start = *offset;
    let unsigned = read_compressed_u32(data, offset)?;
    let width = *offset - start;

    // Magnitude bits after un-rotating: 6, 13 or 28 per bucket.
    let sign_extend = match width {
        1 => 0xFFFF_FFC0_u32,
        2 => 0xFFFF_E000_u32,
        _ => 0xF000_0000_u32,
    };

    let mut value = unsigned >> 1;
    if (unsigned & 1) != 0 {
        value |= sign_extend;
    }

    #[allow(clippy::cast_possible_wrap)]
    Ok(value as i32)
}

/// Write a compressed unsigned integer using the smallest of the three forms.
///
/// # Errors
/// Returns [`crate::Error::CompressedOverflow`] for values above
/// 0x1FFF_FFFF, or [`crate::Error::OutOfBounds`] if the buffer is too short.
pub fn write_compressed_u32(data: &mut [u8], offset: &mut usize, value: u32) -> Result<()> {
    match value {
        0..=0x7F => {
            #[allow(clippy::cast_possible_truncation)]
            crate::io::write_le_at::<u8>(data, offset, value as u8)
        }
        0x80..=0x3FFF => {
            if *offset + 2 > data.len() {
                return Err(OutOfBounds);
            }
            #[allow(clippy::cast_possible_truncation)]
            {
                crate::io::write_le_at::<u8>(data, offset, 0x80 | (value >> 8) as u8)?;
                crate::io::write_le_at::<u8>(data, offset, (value & 0xFF) as u8)?;
            }
            Ok(())
        }
        0x4000..=0x1FFF_FFFF => {
            if *offset + 4 > data.len() {
                return Err(OutOfBounds);
            }
            #[allow(clippy::cast_possible_truncation)]
            {
                crate::io::write_le_at::<u8>(data, offset, 0xC0 | (value >> 24) as u8)?;
                crate::io::write_le_at::<u8>(data, offset, ((value >> 16) & 0xFF) as u8)?;
                crate::io::write_le_at::<u8>(data, offset, ((value >> 8) & 0xFF) as u8)?;
                crate::io::write_le_at::<u8>(data, offset, (value & 0xFF) as u8)?;
            }
            Ok(())
        }
        _ => Err(crate::Error::CompressedOverflow(value)),
    }
}

/// Write a compressed signed integer using the smallest of the three forms.
///
/// # Errors
/// Returns [`crate::Error::CompressedOverflow`] for values outside the
/// 29-bit signed range, or [`crate::Error::OutOfBounds`] if the buffer is
/// too short.
pub fn write_compressed_i32(data: &mut [u8], offset: &mut usize, value: i32) -> Result<()> {
    // Pick the narrowest bucket the two's-complement value fits in, then
    // rotate left by one within that bucket's bit width. The bucket fixes
    // the encoded width: a small rotated value must not collapse into a
    // narrower form, or the sign bit lands in the wrong position on read.
    let (bits, mask) = if (-0x40..=0x3F).contains(&value) {
        (7_u32, 0x7F_u32)
    } else if (-0x2000..=0x1FFF).contains(&value) {
        (14_u32, 0x3FFF_u32)
    } else if (-0x1000_0000..=0x0FFF_FFFF).contains(&value) {
        (29_u32, 0x1FFF_FFFF_u32)
    } else {
        #[allow(clippy::cast_sign_loss)]
        return Err(crate::Error::CompressedOverflow(value as u32));
    };

    #[allow(clippy::cast_sign_loss)]
    let truncated = (value as u32) & mask;
    let rotated = ((truncated << 1) | (truncated >> (bits - 1))) & mask;

    #[allow(clippy::cast_possible_truncation)]
    let written = match bits {
        7 => crate::io::write_le_at::<u8>(data, offset, rotated as u8),
        14 => {
            if *offset + 2 > data.len() {
                return Err(OutOfBounds);
            }
            crate::io::write_le_at::<u8>(data, offset, 0x80 | (rotated >> 8) as u8)?;
            crate::io::write_le_at::<u8>(data, offset, (rotated & 0xFF) as u8)
        }
        _ => {
            if *offset + 4 > data.len() {
                return Err(OutOfBounds);
            }
            crate::io::write_le_at::<u8>(data, offset, 0xC0 | (rotated >> 24) as u8)?;
            crate::io::write_le_at::<u8>(data, offset, ((rotated >> 16) & 0xFF) as u8)?;
            crate::io::write_le_at::<u8>(data, offset, ((rotated >> 8) & 0xFF) as u8)?;
            crate::io::write_le_at::<u8>(data, offset, (rotated & 0xFF) as u8)
        }
    };
    written
}

/// Number of bytes [`write_compressed_u32`] will emit for `value`.
///
/// Values above the wire format's capacity report 4 bytes; the write itself
/// rejects them.
#[must_use]
pub fn compressed_u32_len(value: u32) -> usize {
    match value {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        _ => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_uint_forms() {
        let cases: &[(&[u8], u32)] = &[
            (&[0x00], 0),
            (&[0x03], 3),
            (&[0x7F], 0x7F),
            (&[0x80, 0x80], 0x80),
            (&[0xBF, 0xFF], 0x3FFF),
            (&[0xC0, 0x00, 0x40, 0x00], 0x4000),
            (&[0xDF, 0xFF, 0xFF, 0xFF], 0x1FFF_FFFF),
        ];

        for (bytes, expected) in cases {
            let mut offset = 0;
            assert_eq!(read_compressed_u32(bytes, &mut offset).unwrap(), *expected);
            assert_eq!(offset, bytes.len());
        }
    }

    #[test]
    fn reserved_prefix_modes() {
        // First byte 0xE0 sets a reserved bit of the 4-byte form.
        let data = [0xE0, 0x00, 0x40, 0x00];

        let mut offset = 0;
        assert_eq!(read_compressed_u32(&data, &mut offset).unwrap(), 0x4000);

        offset = 0;
        let result = read_compressed_u32_mode(&data, &mut offset, CompressedMode::Strict);
        assert!(result.is_err());
        assert_eq!(offset, 0);
    }

    #[test]
    fn try_read_short_buffer() {
        // First byte announces 2 bytes, only 1 present.
        let data = [0x80];
        let mut offset = 0;
        assert_eq!(try_read_compressed_u32(&data, &mut offset), None);
        assert_eq!(offset, 0);

        // First byte announces 4 bytes, only 3 present.
        let data = [0xC0, 0x01, 0x02];
        let mut offset = 0;
        assert_eq!(try_read_compressed_u32(&data, &mut offset), None);
        assert_eq!(offset, 0);

        let data = [0x42];
        let mut offset = 0;
        assert_eq!(try_read_compressed_u32(&data, &mut offset), Some(0x42));
        assert_eq!(offset, 1);
    }

    #[test]
    fn boundary_widths() {
        // Bucket boundary values with their exact encoded widths.
        let cases: &[(u32, usize)] = &[
            (0, 1),
            (0x7F, 1),
            (0x80, 2),
            (0x3FFF, 2),
            (0x4000, 4),
            (0x1FFF_FFFF, 4),
        ];

        for (value, width) in cases {
            assert_eq!(compressed_u32_len(*value), *width);

            let mut buffer = [0u8; 4];
            let mut offset = 0;
            write_compressed_u32(&mut buffer, &mut offset, *value).unwrap();
            assert_eq!(offset, *width);

            offset = 0;
            assert_eq!(read_compressed_u32(&buffer, &mut offset).unwrap(), *value);
            assert_eq!(offset, *width);
        }
    }

    #[test]
    fn uint_overflow() {
        let mut buffer = [0u8; 4];
        let mut offset = 0;
        let result = write_compressed_u32(&mut buffer, &mut offset, 0x2000_0000);
        assert!(matches!(result, Err(crate::Error::CompressedOverflow(_))));
    }

    #[test]
    fn signed_known_encodings() {
        // From ECMA-335 §II.23.2: 3 <-> 0x06, -3 <-> 0x7B, 64 <-> 0x8080,
        // -8192 <-> 0x8001, 268435455 <-> 0xDFFFFFFE, -268435456 <-> 0xC0000001.
        let cases: &[(&[u8], i32)] = &[
            (&[0x06], 3),
            (&[0x7B], -3),
            (&[0x80, 0x80], 64),
            (&[0x80, 0x01], -8192),
            (&[0xDF, 0xFF, 0xFF, 0xFE], 268_435_455),
            (&[0xC0, 0x00, 0x00, 0x01], -268_435_456),
        ];

        for (bytes, expected) in cases {
            let mut offset = 0;
            assert_eq!(read_compressed_i32(bytes, &mut offset).unwrap(), *expected);
            assert_eq!(offset, bytes.len());

            let mut buffer = [0u8; 4];
            offset = 0;
            write_compressed_i32(&mut buffer, &mut offset, *expected).unwrap();
            assert_eq!(&buffer[..offset], *bytes);
        }
    }

    #[test]
    fn signed_round_trip() {
        for value in [-64, -63, -1, 0, 1, 63, -8192, 8191, -0x1000_0000, 0x0FFF_FFFF] {
            let mut buffer = [0u8; 4];
            let mut offset = 0;
            write_compressed_i32(&mut buffer, &mut offset, value).unwrap();

            let mut cursor = 0;
            assert_eq!(read_compressed_i32(&buffer, &mut cursor).unwrap(), value);
            assert_eq!(cursor, offset);
        }
    }

    #[test]
    fn signed_overflow() {
        let mut buffer = [0u8; 4];
        let mut offset = 0;
        assert!(write_compressed_i32(&mut buffer, &mut offset, 0x1000_0000).is_err());
        assert!(write_compressed_i32(&mut buffer, &mut offset, -0x1000_0001).is_err());
    }
}
