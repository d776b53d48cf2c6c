//! Raster sources
//!
//! A raster reaches the converter as a URL, an in-memory buffer or a local
//! file. Every source is resolved to one contiguous byte slice before
//! decoding; files are memory mapped rather than copied.

use std::fs::File;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use bytes::{Bytes, BytesMut};
use memmap2::Mmap;
use tracing::debug;

use crate::error::{Error, Result};

/// Download limit used when the caller does not configure one
pub const DEFAULT_MAX_RASTER_BYTES: usize = 100 * 1024 * 1024;

/// Where a raster is read from
#[derive(Debug, Clone)]
pub enum RasterSource {
    /// Remote raster fetched over HTTP(S)
    Url(String),
    /// Raster already held in memory
    Bytes(Bytes),
    /// Local raster file
    Path(PathBuf),
}

impl RasterSource {
    /// Interprets a command-line style location: `http://` and `https://`
    /// locations are URLs, anything else is a file path.
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            RasterSource::Url(location.to_string())
        } else {
            RasterSource::Path(PathBuf::from(location))
        }
    }

    /// Resolves the source to its raw bytes. Downloads larger than
    /// `max_bytes` fail.
    pub async fn load(&self, client: &reqwest::Client, max_bytes: usize) -> Result<RasterData> {
        match self {
            RasterSource::Url(url) => Ok(RasterData::Owned(fetch(client, url, max_bytes).await?)),
            RasterSource::Bytes(bytes) => Ok(RasterData::Owned(bytes.clone())),
            RasterSource::Path(path) => map_file(path),
        }
    }
}

impl From<Bytes> for RasterSource {
    fn from(bytes: Bytes) -> Self {
        RasterSource::Bytes(bytes)
    }
}

impl From<Vec<u8>> for RasterSource {
    fn from(bytes: Vec<u8>) -> Self {
        RasterSource::Bytes(Bytes::from(bytes))
    }
}

/// Raw raster bytes, either owned or memory mapped
pub enum RasterData {
    Owned(Bytes),
    Mapped(Mmap),
}

impl Deref for RasterData {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            RasterData::Owned(bytes) => bytes,
            RasterData::Mapped(mmap) => mmap,
        }
    }
}

/// Memory maps a local raster file
pub fn map_file<P: AsRef<Path>>(path: P) -> Result<RasterData> {
    let file = File::open(path.as_ref())?;
    // SAFETY: the mapping is read-only and dropped with the RasterData; the
    // file is not expected to be truncated while a conversion runs.
    let mmap = unsafe { Mmap::map(&file)? };
    debug!(path = %path.as_ref().display(), size = mmap.len(), "Mapped raster file");
    Ok(RasterData::Mapped(mmap))
}

/// Downloads a raster, failing on any non-success HTTP status and on
/// bodies larger than `max_bytes`
pub async fn fetch(client: &reqwest::Client, url: &str, max_bytes: usize) -> Result<Bytes> {
    debug!(url, max_bytes, "Fetching raster");

    let mut response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::Fetch(format!("{} returned HTTP {}", url, status)));
    }

    let too_large = || Error::Fetch(format!("{} exceeds the {} byte raster limit", url, max_bytes));
    let declared = response.content_length();
    if declared.is_some_and(|len| len > max_bytes as u64) {
        return Err(too_large());
    }

    let mut body = BytesMut::with_capacity(declared.map_or(0, |len| len as usize));
    while let Some(chunk) = response.chunk().await? {
        if body.len() + chunk.len() > max_bytes {
            return Err(too_large());
        }
        body.extend_from_slice(&chunk);
    }

    debug!(url, size = body.len(), "Fetched raster");
    Ok(body.freeze())
}
