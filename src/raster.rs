//! Decoded single-band rasters

use tracing::{debug, info, trace};

use crate::error::{Error, Result};
use crate::formats::tiff::{GeoInfo, TiffReader, IFD};
use crate::types::{DataType, Dimensions, Resolution};

/// Metadata of the converted band
#[derive(Debug, Clone, PartialEq)]
pub struct RasterInfo {
    pub dimensions: Dimensions,
    /// Sample type as stored in the file
    pub data_type: DataType,
    /// Pixel size as reported by the raster; `y` is negative for north-up
    pub resolution: Resolution,
    pub epsg_code: Option<u16>,
    pub citation: Option<String>,
    /// GDAL_NODATA as written; informational only
    pub nodata: Option<String>,
    /// Model coordinates of the upper-left corner
    pub origin: Option<(f64, f64)>,
}

impl RasterInfo {
    /// Reads dimensions, sample type and georeferencing from a directory
    /// without touching pixel data.
    pub fn from_ifd(ifd: &IFD) -> Result<Self> {
        let dimensions = ifd
            .dimensions()
            .ok_or(Error::MissingTag(crate::formats::tiff::tags::IMAGE_WIDTH))?;
        if dimensions.is_empty() {
            return Err(Error::InvalidFormat(format!(
                "Image has zero dimensions {}x{}",
                dimensions.width, dimensions.height
            )));
        }

        let data_type = ifd.data_type()?;
        let geo = GeoInfo::from_ifd(ifd);
        trace!("{}", geo);

        Ok(Self {
            dimensions,
            data_type,
            resolution: geo.resolution()?,
            epsg_code: geo.epsg_code,
            citation: geo.citation.clone(),
            nodata: geo.nodata.clone(),
            origin: geo.origin(),
        })
    }

    pub fn width(&self) -> usize {
        self.dimensions.width
    }

    pub fn height(&self) -> usize {
        self.dimensions.height
    }
}

/// Row-major band of samples widened to f64, immutable once decoded
#[derive(Debug, Clone)]
pub struct Raster {
    info: RasterInfo,
    samples: Vec<f64>,
}

impl Raster {
    /// Decodes the first image of a TIFF file
    pub fn decode(data: &[u8]) -> Result<Self> {
        let reader = TiffReader::new(data)?;
        let tiff = reader.read()?;
        trace!("{}", tiff);

        let ifd = tiff
            .main_ifd()
            .ok_or_else(|| Error::InvalidFormat("File contains no IFD".to_string()))?;
        if tiff.ifd_count() > 1 {
            debug!(ifds = tiff.ifd_count(), "Ignoring additional images");
        }

        let info = RasterInfo::from_ifd(ifd)?;
        let samples = reader.read_band(ifd)?;

        info!(
            width = info.width(),
            height = info.height(),
            data_type = info.data_type.name(),
            res_x = info.resolution.x,
            res_y = info.resolution.y,
            epsg = ?info.epsg_code,
            "Decoded raster"
        );

        Ok(Self { info, samples })
    }

    /// Wraps already decoded samples
    pub fn from_samples(
        width: usize,
        height: usize,
        resolution: Resolution,
        samples: Vec<f64>,
    ) -> Result<Self> {
        let dimensions = Dimensions::new(width, height);
        if dimensions.is_empty() || samples.len() != dimensions.pixel_count() {
            return Err(Error::InvalidFormat(format!(
                "{} samples do not fill a {}x{} raster",
                samples.len(),
                width,
                height
            )));
        }

        Ok(Self {
            info: RasterInfo {
                dimensions,
                data_type: DataType::F64,
                resolution,
                epsg_code: None,
                citation: None,
                nodata: None,
                origin: None,
            },
            samples,
        })
    }

    pub fn info(&self) -> &RasterInfo {
        &self.info
    }

    pub fn width(&self) -> usize {
        self.info.width()
    }

    pub fn height(&self) -> usize {
        self.info.height()
    }

    pub fn resolution(&self) -> Resolution {
        self.info.resolution
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }
}
