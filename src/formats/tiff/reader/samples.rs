//! Widening of raw samples to f64

use crate::io::ByteOrder;
use crate::types::DataType;

/// Reads one sample from the start of `raw`.
///
/// `raw` must hold at least `data_type.size()` bytes in the file's byte
/// order.
pub fn read_sample(raw: &[u8], data_type: DataType, byte_order: ByteOrder) -> f64 {
    match data_type {
        DataType::U8 => raw[0] as f64,
        DataType::I8 => raw[0] as i8 as f64,
        DataType::U16 => byte_order.u16_at(raw) as f64,
        DataType::I16 => byte_order.i16_at(raw) as f64,
        DataType::U32 => byte_order.u32_at(raw) as f64,
        DataType::I32 => byte_order.i32_at(raw) as f64,
        DataType::F32 => byte_order.f32_at(raw) as f64,
        DataType::F64 => byte_order.f64_at(raw),
    }
}
