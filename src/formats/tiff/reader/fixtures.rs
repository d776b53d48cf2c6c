//! In-memory TIFF writer for tests

use std::io::Write;

use flate2::write::ZlibEncoder;

use crate::compression::{lzw, Compression, Predictor};
use crate::formats::tiff::tags::{self, field_types};
use crate::io::ByteOrder;
use crate::types::DataType;

struct RawEntry {
    tag: u16,
    field_type: u16,
    count: u64,
    payload: Vec<u8>,
}

/// Builds single-image TIFF files with arbitrary layout, codec and tags
pub(crate) struct TiffBuilder {
    width: usize,
    height: usize,
    byte_order: ByteOrder,
    big_tiff: bool,
    data_type: DataType,
    samples_per_pixel: usize,
    planar: bool,
    rows_per_strip: Option<usize>,
    tiles: Option<(usize, usize)>,
    compression: Compression,
    compression_tag: Option<u16>,
    predictor: Predictor,
    pixel_scale: Option<[f64; 3]>,
    samples: Vec<f64>,
    empty_chunks: Vec<usize>,
    extra: Vec<RawEntry>,
}

impl TiffBuilder {
    pub(crate) fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            byte_order: ByteOrder::LittleEndian,
            big_tiff: false,
            data_type: DataType::F32,
            samples_per_pixel: 1,
            planar: false,
            rows_per_strip: None,
            tiles: None,
            compression: Compression::None,
            compression_tag: None,
            predictor: Predictor::None,
            pixel_scale: Some([1.0, 1.0, 0.0]),
            samples: vec![0.0; width * height],
            empty_chunks: Vec::new(),
            extra: Vec::new(),
        }
    }

    pub(crate) fn big_endian(mut self) -> Self {
        self.byte_order = ByteOrder::BigEndian;
        self
    }

    pub(crate) fn big_tiff(mut self) -> Self {
        self.big_tiff = true;
        self
    }

    pub(crate) fn data_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }

    pub(crate) fn samples_per_pixel(mut self, samples_per_pixel: usize) -> Self {
        self.samples_per_pixel = samples_per_pixel;
        self
    }

    pub(crate) fn planar(mut self) -> Self {
        self.planar = true;
        self
    }

    pub(crate) fn rows_per_strip(mut self, rows: usize) -> Self {
        self.rows_per_strip = Some(rows);
        self
    }

    pub(crate) fn tiles(mut self, width: usize, height: usize) -> Self {
        self.tiles = Some((width, height));
        self
    }

    pub(crate) fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Writes an arbitrary Compression tag value; chunks stay uncompressed
    pub(crate) fn raw_compression_tag(mut self, value: u16) -> Self {
        self.compression_tag = Some(value);
        self
    }

    pub(crate) fn predictor(mut self, predictor: Predictor) -> Self {
        self.predictor = predictor;
        self
    }

    pub(crate) fn pixel_scale(mut self, scale: Option<[f64; 3]>) -> Self {
        self.pixel_scale = scale;
        self
    }

    /// Interleaved samples, `samples_per_pixel` values per pixel
    pub(crate) fn samples(mut self, samples: Vec<f64>) -> Self {
        self.samples = samples;
        self
    }

    /// Stores the given chunk with a byte count of zero
    pub(crate) fn empty_chunk(mut self, index: usize) -> Self {
        self.empty_chunks.push(index);
        self
    }

    pub(crate) fn tag_doubles(mut self, tag: u16, values: &[f64]) -> Self {
        let payload = values
            .iter()
            .flat_map(|v| self.bytes_u64(v.to_bits(), 8))
            .collect();
        self.extra.push(RawEntry { tag, field_type: field_types::DOUBLE, count: values.len() as u64, payload });
        self
    }

    pub(crate) fn tag_shorts(mut self, tag: u16, values: &[u16]) -> Self {
        let payload = values
            .iter()
            .flat_map(|&v| self.bytes_u64(v as u64, 2))
            .collect();
        self.extra.push(RawEntry { tag, field_type: field_types::SHORT, count: values.len() as u64, payload });
        self
    }

    pub(crate) fn tag_ascii(mut self, tag: u16, text: &str) -> Self {
        let mut payload = text.as_bytes().to_vec();
        payload.push(0);
        self.extra.push(RawEntry { tag, field_type: field_types::ASCII, count: payload.len() as u64, payload });
        self
    }

    /// Serializes an integer of `size` bytes in the builder's byte order
    fn bytes_u64(&self, value: u64, size: usize) -> Vec<u8> {
        let mut buf = [0u8; 8];
        match size {
            1 => buf[0] = value as u8,
            2 => self.byte_order.put_u16(&mut buf, value as u16),
            4 => self.byte_order.put_u32(&mut buf, value as u32),
            _ => self.byte_order.put_u64(&mut buf, value),
        }
        buf[..size].to_vec()
    }

    fn sample_bytes(&self, value: f64) -> Vec<u8> {
        let size = self.data_type.size();
        let bits = match self.data_type {
            DataType::U8 | DataType::U16 | DataType::U32 => value as u64,
            DataType::I8 => value as i8 as u8 as u64,
            DataType::I16 => value as i16 as u16 as u64,
            DataType::I32 => value as i32 as u32 as u64,
            DataType::F32 => (value as f32).to_bits() as u64,
            DataType::F64 => value.to_bits(),
        };
        self.bytes_u64(bits, size)
    }

    fn chunk_geometry(&self) -> (usize, usize, usize, usize) {
        match self.tiles {
            Some((tw, th)) => (tw, th, self.width.div_ceil(tw), self.height.div_ceil(th)),
            None => {
                let rows = self.rows_per_strip.unwrap_or(self.height).max(1);
                (self.width, rows, 1, self.height.div_ceil(rows).max(1))
            }
        }
    }

    fn encode_chunks(&self) -> Vec<Vec<u8>> {
        let (cw, ch, across, down) = self.chunk_geometry();
        let planes = if self.planar { self.samples_per_pixel } else { 1 };
        let spp = if self.planar { 1 } else { self.samples_per_pixel };
        let size = self.data_type.size();
        let mut chunks = Vec::new();

        for plane in 0..planes {
            for cy in 0..down {
                for cx in 0..across {
                    let rows = if self.tiles.is_some() {
                        ch
                    } else {
                        ch.min(self.height - cy * ch)
                    };

                    let mut raw = Vec::with_capacity(rows * cw * spp * size);
                    for r in 0..rows {
                        for c in 0..cw {
                            let (x, y) = (cx * cw + c, cy * ch + r);
                            for s in 0..spp {
                                let value = if x < self.width && y < self.height {
                                    let channel = if self.planar { plane } else { s };
                                    self.samples[(y * self.width + x) * self.samples_per_pixel + channel]
                                } else {
                                    0.0
                                };
                                raw.extend(self.sample_bytes(value));
                            }
                        }
                    }

                    let row_len = cw * spp * size;
                    if row_len > 0 {
                        for row in raw.chunks_mut(row_len) {
                            self.forward_predictor(row, spp, size);
                        }
                    }
                    chunks.push(self.compress(&raw));
                }
            }
        }

        chunks
    }

    fn forward_predictor(&self, row: &mut [u8], spp: usize, size: usize) {
        match self.predictor {
            Predictor::None => {}
            Predictor::Horizontal => {
                let stride = spp * size;
                for i in (stride..row.len()).step_by(size).rev() {
                    let bo = self.byte_order;
                    match size {
                        1 => row[i] = row[i].wrapping_sub(row[i - stride]),
                        2 => {
                            let v = bo.u16_at(&row[i..]).wrapping_sub(bo.u16_at(&row[i - stride..]));
                            bo.put_u16(&mut row[i..], v);
                        }
                        4 => {
                            let v = bo.u32_at(&row[i..]).wrapping_sub(bo.u32_at(&row[i - stride..]));
                            bo.put_u32(&mut row[i..], v);
                        }
                        _ => {
                            let v = bo.u64_at(&row[i..]).wrapping_sub(bo.u64_at(&row[i - stride..]));
                            bo.put_u64(&mut row[i..], v);
                        }
                    }
                }
            }
            Predictor::FloatingPoint => {
                let samples = row.len() / size;
                let mut planes = vec![0u8; row.len()];
                for k in 0..samples {
                    for b in 0..size {
                        let plane = match self.byte_order {
                            ByteOrder::BigEndian => b,
                            ByteOrder::LittleEndian => size - b - 1,
                        };
                        planes[plane * samples + k] = row[size * k + b];
                    }
                }
                for i in (spp..planes.len()).rev() {
                    planes[i] = planes[i].wrapping_sub(planes[i - spp]);
                }
                row.copy_from_slice(&planes);
            }
        }
    }

    fn compress(&self, raw: &[u8]) -> Vec<u8> {
        if self.compression_tag.is_some() {
            return raw.to_vec();
        }
        match self.compression {
            Compression::None => raw.to_vec(),
            Compression::Lzw => lzw::encoder::encode(raw),
            Compression::Deflate => {
                let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
                encoder.write_all(raw).unwrap();
                encoder.finish().unwrap()
            }
            Compression::PackBits => packbits(raw),
        }
    }

    fn compression_value(&self) -> u16 {
        self.compression_tag.unwrap_or(match self.compression {
            Compression::None => 1,
            Compression::Lzw => 5,
            Compression::Deflate => 8,
            Compression::PackBits => 32773,
        })
    }

    fn predictor_value(&self) -> u16 {
        match self.predictor {
            Predictor::None => 1,
            Predictor::Horizontal => 2,
            Predictor::FloatingPoint => 3,
        }
    }

    fn sample_format(&self) -> u16 {
        match self.data_type {
            DataType::U8 | DataType::U16 | DataType::U32 => 1,
            DataType::I8 | DataType::I16 | DataType::I32 => 2,
            DataType::F32 | DataType::F64 => 3,
        }
    }

    fn long_entry(&self, tag: u16, values: &[u64]) -> RawEntry {
        let (field_type, size) = if self.big_tiff {
            (field_types::LONG8, 8)
        } else {
            (field_types::LONG, 4)
        };
        RawEntry {
            tag,
            field_type,
            count: values.len() as u64,
            payload: values.iter().flat_map(|&v| self.bytes_u64(v, size)).collect(),
        }
    }

    fn short_entry(&self, tag: u16, values: &[u16]) -> RawEntry {
        RawEntry {
            tag,
            field_type: field_types::SHORT,
            count: values.len() as u64,
            payload: values.iter().flat_map(|&v| self.bytes_u64(v as u64, 2)).collect(),
        }
    }

    pub(crate) fn build(self) -> Vec<u8> {
        let bo = self.byte_order;
        let mut out = Vec::new();
        out.extend_from_slice(match bo {
            ByteOrder::LittleEndian => b"II",
            ByteOrder::BigEndian => b"MM",
        });
        if self.big_tiff {
            out.extend(self.bytes_u64(43, 2));
            out.extend(self.bytes_u64(8, 2));
            out.extend(self.bytes_u64(0, 2));
            out.extend(self.bytes_u64(0, 8));
        } else {
            out.extend(self.bytes_u64(42, 2));
            out.extend(self.bytes_u64(0, 4));
        }

        let mut offsets = Vec::new();
        let mut counts = Vec::new();
        for (index, chunk) in self.encode_chunks().into_iter().enumerate() {
            if self.empty_chunks.contains(&index) {
                offsets.push(0u64);
                counts.push(0u64);
                continue;
            }
            offsets.push(out.len() as u64);
            counts.push(chunk.len() as u64);
            out.extend(chunk);
            if out.len() % 2 == 1 {
                out.push(0);
            }
        }

        let offset_size = if self.big_tiff { 8 } else { 4 };

        let bits = (self.data_type.size() * 8) as u16;
        let mut entries = vec![
            self.long_entry(tags::IMAGE_WIDTH, &[self.width as u64]),
            self.long_entry(tags::IMAGE_LENGTH, &[self.height as u64]),
            self.short_entry(tags::BITS_PER_SAMPLE, &vec![bits; self.samples_per_pixel][..]),
            self.short_entry(tags::COMPRESSION, &[self.compression_value()]),
            self.short_entry(tags::SAMPLES_PER_PIXEL, &[self.samples_per_pixel as u16]),
            self.short_entry(tags::PLANAR_CONFIGURATION, &[if self.planar { 2 } else { 1 }]),
            self.short_entry(tags::SAMPLE_FORMAT, &vec![self.sample_format(); self.samples_per_pixel][..]),
        ];
        if self.predictor != Predictor::None {
            entries.push(self.short_entry(tags::PREDICTOR, &[self.predictor_value()]));
        }
        match self.tiles {
            Some((tw, th)) => {
                entries.push(self.long_entry(tags::TILE_WIDTH, &[tw as u64]));
                entries.push(self.long_entry(tags::TILE_LENGTH, &[th as u64]));
                entries.push(self.long_entry(tags::TILE_OFFSETS, &offsets));
                entries.push(self.long_entry(tags::TILE_BYTE_COUNTS, &counts));
            }
            None => {
                if let Some(rows) = self.rows_per_strip {
                    entries.push(self.long_entry(tags::ROWS_PER_STRIP, &[rows as u64]));
                }
                entries.push(self.long_entry(tags::STRIP_OFFSETS, &offsets));
                entries.push(self.long_entry(tags::STRIP_BYTE_COUNTS, &counts));
            }
        }
        if let Some(scale) = self.pixel_scale {
            entries.push(RawEntry {
                tag: tags::MODEL_PIXEL_SCALE,
                field_type: field_types::DOUBLE,
                count: 3,
                payload: scale.iter().flat_map(|v| self.bytes_u64(v.to_bits(), 8)).collect(),
            });
        }
        let mut extra = self.extra;
        entries.append(&mut extra);
        entries.sort_by_key(|e| e.tag);

        // Out-of-line payloads, then the directory itself
        let mut value_fields = Vec::new();
        for entry in &entries {
            let mut field = vec![0u8; offset_size];
            if entry.payload.len() <= offset_size {
                field[..entry.payload.len()].copy_from_slice(&entry.payload);
            } else {
                let at = out.len() as u64;
                out.extend_from_slice(&entry.payload);
                if out.len() % 2 == 1 {
                    out.push(0);
                }
                field = bytes_in(bo, at, offset_size);
            }
            value_fields.push(field);
        }

        let ifd_offset = out.len() as u64;
        out.extend(bytes_in(bo, entries.len() as u64, if self.big_tiff { 8 } else { 2 }));
        for (entry, field) in entries.iter().zip(value_fields) {
            out.extend(bytes_in(bo, entry.tag as u64, 2));
            out.extend(bytes_in(bo, entry.field_type as u64, 2));
            out.extend(bytes_in(bo, entry.count, offset_size));
            out.extend(field);
        }
        out.extend(bytes_in(bo, 0, offset_size));

        let header_slot = if self.big_tiff { 8 } else { 4 };
        let pointer = bytes_in(bo, ifd_offset, offset_size);
        out[header_slot..header_slot + offset_size].copy_from_slice(&pointer);
        out
    }
}

fn bytes_in(byte_order: ByteOrder, value: u64, size: usize) -> Vec<u8> {
    let mut buf = [0u8; 8];
    match size {
        2 => byte_order.put_u16(&mut buf, value as u16),
        4 => byte_order.put_u32(&mut buf, value as u32),
        _ => byte_order.put_u64(&mut buf, value),
    }
    buf[..size].to_vec()
}

/// PackBits encoder producing both literal and repeat runs
fn packbits(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < data.len() {
        let mut run = 1;
        while i + run < data.len() && run < 128 && data[i + run] == data[i] {
            run += 1;
        }

        if run >= 2 {
            out.push((1 - run as i32) as i8 as u8);
            out.push(data[i]);
            i += run;
        } else {
            let start = i;
            while i < data.len() && i - start < 128 && !(i + 1 < data.len() && data[i] == data[i + 1]) {
                i += 1;
            }
            out.push((i - start - 1) as u8);
            out.extend_from_slice(&data[start..i]);
        }
    }
    out
}
