//! Core data types for firemap-rasterizer

/// Represents pixel sample data types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// Unsigned 8-bit integer
    U8,
    /// Unsigned 16-bit integer
    U16,
    /// Unsigned 32-bit integer
    U32,
    /// Signed 8-bit integer
    I8,
    /// Signed 16-bit integer
    I16,
    /// Signed 32-bit integer
    I32,
    /// 32-bit floating point
    F32,
    /// 64-bit floating point
    F64,
}

impl DataType {
    /// Resolves a data type from the TIFF SampleFormat and BitsPerSample tags
    /// (format 1=unsigned, 2=signed, 3=float)
    pub fn from_format(sample_format: u64, bits: u64) -> Option<Self> {
        match (sample_format, bits) {
            (1, 8) => Some(DataType::U8),
            (1, 16) => Some(DataType::U16),
            (1, 32) => Some(DataType::U32),
            (2, 8) => Some(DataType::I8),
            (2, 16) => Some(DataType::I16),
            (2, 32) => Some(DataType::I32),
            (3, 32) => Some(DataType::F32),
            (3, 64) => Some(DataType::F64),
            _ => None,
        }
    }

    /// Returns the size in bytes for this data type
    pub fn size(&self) -> usize {
        match self {
            DataType::U8 | DataType::I8 => 1,
            DataType::U16 | DataType::I16 => 2,
            DataType::U32 | DataType::I32 | DataType::F32 => 4,
            DataType::F64 => 8,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, DataType::F32 | DataType::F64)
    }

    /// Returns the name of this data type
    pub fn name(&self) -> &'static str {
        match self {
            DataType::U8 => "U8",
            DataType::U16 => "U16",
            DataType::U32 => "U32",
            DataType::I8 => "I8",
            DataType::I16 => "I16",
            DataType::I32 => "I32",
            DataType::F32 => "F32",
            DataType::F64 => "F64",
        }
    }
}

/// Raster dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: usize,
    pub height: usize,
}

impl Dimensions {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Returns the total number of pixels
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Real-world size of one pixel as reported by the raster (typically meters).
///
/// Follows the GeoTIFF convention where `y` is negative for north-up images.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Resolution {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_size() {
        assert_eq!(DataType::U8.size(), 1);
        assert_eq!(DataType::U16.size(), 2);
        assert_eq!(DataType::U32.size(), 4);
        assert_eq!(DataType::F32.size(), 4);
        assert_eq!(DataType::F64.size(), 8);
    }

    #[test]
    fn test_data_type_from_format() {
        assert_eq!(DataType::from_format(1, 8), Some(DataType::U8));
        assert_eq!(DataType::from_format(2, 16), Some(DataType::I16));
        assert_eq!(DataType::from_format(3, 32), Some(DataType::F32));
        assert_eq!(DataType::from_format(3, 16), None);
        assert_eq!(DataType::from_format(1, 12), None);
    }

    #[test]
    fn test_data_type_name() {
        assert_eq!(DataType::U8.name(), "U8");
        assert_eq!(DataType::F32.name(), "F32");
        assert!(DataType::F64.is_float());
        assert!(!DataType::I32.is_float());
    }

    #[test]
    fn test_dimensions() {
        let dims = Dimensions::new(100, 200);
        assert_eq!(dims.width, 100);
        assert_eq!(dims.height, 200);
        assert_eq!(dims.pixel_count(), 20000);
        assert!(!dims.is_empty());
        assert!(Dimensions::new(0, 5).is_empty());
    }
}
