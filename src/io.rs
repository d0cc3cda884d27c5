//! Bounds-checked little-endian reading and writing over in-memory buffers.
//!
//! Every table row, header field and heap index in the tables stream is a
//! little-endian fixed-width integer, so this module only carries the
//! little-endian unsigned subset. The `*_dyn` variants read or write either
//! 2 or 4 bytes depending on a width flag, which is how heap indices and
//! table references change width with heap and table sizes.
//!
//! All functions return [`crate::Error::OutOfBounds`] instead of panicking
//! when the buffer is too short, and advance the caller's offset only on
//! success.

use crate::{Error::OutOfBounds, Result};

/// Fixed-width unsigned integers that can be read from and written to a
/// byte buffer in little-endian order.
pub trait LeInt: Sized + Copy {
    /// Associated byte-array type, e.g. `[u8; 4]` for `u32`.
    type Bytes: Sized + for<'a> TryFrom<&'a [u8]> + AsRef<[u8]>;

    /// Decode from little-endian bytes.
    fn from_le_bytes(bytes: Self::Bytes) -> Self;
    /// Encode to little-endian bytes.
    fn to_le_bytes(self) -> Self::Bytes;
}

macro_rules! impl_le_int {
    ($($ty:ty => $len:literal),+ $(,)?) => {
        $(
            impl LeInt for $ty {
                type Bytes = [u8; $len];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }

                fn to_le_bytes(self) -> Self::Bytes {
                    <$ty>::to_le_bytes(self)
                }
            }
        )+
    };
}

impl_le_int!(u8 => 1, u16 => 2, u32 => 4, u64 => 8);

/// Read a `T` from the start of `data`.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if `data` is shorter than `T`.
pub fn read_le<T: LeInt>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_le_at(data, &mut offset)
}

/// Read a `T` at `offset`, advancing the offset on success.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the remaining bytes are shorter than `T`.
pub fn read_le_at<T: LeInt>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    if (type_len + *offset) > data.len() {
        return Err(OutOfBounds);
    }

    let Ok(read) = data[*offset..*offset + type_len].try_into() else {
        return Err(OutOfBounds);
    };

    *offset += type_len;

    Ok(T::from_le_bytes(read))
}

/// Read either a `u16` (promoted to `u32`) or a `u32` depending on `wide`.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the remaining bytes are too short.
pub fn read_le_at_dyn(data: &[u8], offset: &mut usize, wide: bool) -> Result<u32> {
    let res = if wide {
        read_le_at::<u32>(data, offset)?
    } else {
        u32::from(read_le_at::<u16>(data, offset)?)
    };

    Ok(res)
}

/// Write a `T` at `offset`, advancing the offset on success.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the remaining bytes are shorter than `T`.
pub fn write_le_at<T: LeInt>(data: &mut [u8], offset: &mut usize, value: T) -> Result<()> {
    let type_len = std::mem::size_of::<T>();
    if (type_len + *offset) > data.len() {
        return Err(OutOfBounds);
    }

    let bytes = value.to_le_bytes();
    data[*offset..*offset + type_len].copy_from_slice(bytes.as_ref());
    *offset += type_len;

    Ok(())
}

/// Write either the low 16 bits or all 32 bits of `value` depending on `wide`.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the remaining bytes are too short.
pub fn write_le_at_dyn(data: &mut [u8], offset: &mut usize, value: u32, wide: bool) -> Result<()> {
    if wide {
        write_le_at::<u32>(data, offset, value)?;
    } else {
        #[allow(clippy::cast_possible_truncation)]
        write_le_at::<u16>(data, offset, value as u16)?;
    }

    Ok(())
}
