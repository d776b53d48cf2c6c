//! Byte order (endianness) handling
//!
//! TIFF files declare their byte order in the first two bytes of the header.
//! Every multi-byte value in the file, including the raw sample data, uses
//! that order.

use std::io::{self, Read};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use byteorder::ByteOrder as Endian;

/// Represents the byte order (endianness) of binary data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian byte order (least significant byte first)
    LittleEndian,
    /// Big-endian byte order (most significant byte first)
    BigEndian,
}

macro_rules! read_stream {
    ($name:ident, $ty:ty, $method:ident) => {
        pub fn $name<R: Read>(&self, reader: &mut R) -> io::Result<$ty> {
            match self {
                ByteOrder::LittleEndian => reader.$method::<LittleEndian>(),
                ByteOrder::BigEndian => reader.$method::<BigEndian>(),
            }
        }
    };
}

macro_rules! read_slice {
    ($name:ident, $ty:ty, $method:ident) => {
        /// Decodes a value from the start of `buf`; panics if `buf` is too short.
        pub fn $name(&self, buf: &[u8]) -> $ty {
            match self {
                ByteOrder::LittleEndian => LittleEndian::$method(buf),
                ByteOrder::BigEndian => BigEndian::$method(buf),
            }
        }
    };
}

macro_rules! write_slice {
    ($name:ident, $ty:ty, $method:ident) => {
        pub fn $name(&self, buf: &mut [u8], value: $ty) {
            match self {
                ByteOrder::LittleEndian => LittleEndian::$method(buf, value),
                ByteOrder::BigEndian => BigEndian::$method(buf, value),
            }
        }
    };
}

impl ByteOrder {
    /// Detects byte order from TIFF magic bytes
    ///
    /// TIFF files start with either "II" (0x4949) for little-endian
    /// or "MM" (0x4D4D) for big-endian.
    pub fn from_tiff_magic(magic: [u8; 2]) -> Option<Self> {
        match &magic {
            b"II" => Some(ByteOrder::LittleEndian),
            b"MM" => Some(ByteOrder::BigEndian),
            _ => None,
        }
    }

    read_stream!(read_u16, u16, read_u16);
    read_stream!(read_u32, u32, read_u32);
    read_stream!(read_u64, u64, read_u64);

    read_slice!(u16_at, u16, read_u16);
    read_slice!(u32_at, u32, read_u32);
    read_slice!(u64_at, u64, read_u64);
    read_slice!(i16_at, i16, read_i16);
    read_slice!(i32_at, i32, read_i32);
    read_slice!(i64_at, i64, read_i64);
    read_slice!(f32_at, f32, read_f32);
    read_slice!(f64_at, f64, read_f64);

    write_slice!(put_u16, u16, write_u16);
    write_slice!(put_u32, u32, write_u32);
    write_slice!(put_u64, u64, write_u64);
}
