use crate::clut::ColorTable;
use crate::decompress;
use crate::image::{AlphaColor, Raster};
use crate::stream::{StreamError, Streamer};

#[derive(Debug)]
pub enum QuickDrawError {
    Truncated { at: usize },
    UnsupportedDepth(i16),
    UnsupportedPacking(i16),
    Malformed(&'static str),
}

impl From<StreamError> for QuickDrawError {
    fn from(error: StreamError) -> Self {
        match error {
            StreamError::Truncated{ at } => QuickDrawError::Truncated{ at },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub top: i16,
    pub left: i16,
    pub bottom: i16,
    pub right: i16,
}

impl Rect {
    pub fn read(stream: &mut Streamer) -> Result<Rect, StreamError> {
        let top = stream.get_i16()?;
        let left = stream.get_i16()?;
        let bottom = stream.get_i16()?;
        let right = stream.get_i16()?;
        Ok(Rect{ top, left, bottom, right })
    }

    pub fn width(&self) -> i16 {
        self.right - self.left
    }

    pub fn height(&self) -> i16 {
        self.bottom - self.top
    }

    pub fn same_size(&self, other: &Rect) -> bool {
        self.width() == other.width() && self.height() == other.height()
    }

    pub fn intersect(a: Rect, b: Rect) -> Rect {
        Rect{
            top: a.top.max(b.top),
            left: a.left.max(b.left),
            bottom: a.bottom.min(b.bottom),
            right: a.right.min(b.right),
        }
    }
}

const PIXEL_TYPE_INDEXED: i16 = 0;
const PIXEL_TYPE_RGB_DIRECT: i16 = 16;

const PACK_TYPE_DEFAULT: i16 = 0;
const PACK_TYPE_PIXEL_RUN_LENGTH: i16 = 3;
const PACK_TYPE_COMPONENT_RUN_LENGTH: i16 = 4;

/// A QuickDraw pixel map header. The handle field that precedes it in some
/// structures ('cicn', directBitsRect) is read by the caller.
pub struct PixMap {
    pub row_bytes: u16,
    pub bounds: Rect,
    pub pm_version: i16,
    pub pack_type: i16,
    pub pack_size: u32,
    pub h_res: u32,
    pub v_res: u32,
    pub pixel_type: i16,
    pub pixel_size: i16,
    pub cmp_count: i16,
    pub cmp_size: i16,
    pub plane_bytes: u32,
    pub pm_table: u32,
}

impl PixMap {
    pub fn read(stream: &mut Streamer) -> Result<PixMap, QuickDrawError> {
        let row_bytes = stream.get_u16()? & 0x3fff;
        let bounds = Rect::read(stream)?;
        let pm_version = stream.get_i16()?;
        let pack_type = stream.get_i16()?;
        let pack_size = stream.get_u32()?;
        let h_res = stream.get_u32()?;
        let v_res = stream.get_u32()?;
        let pixel_type = stream.get_i16()?;
        let pixel_size = stream.get_i16()?;
        let cmp_count = stream.get_i16()?;
        let cmp_size = stream.get_i16()?;
        let plane_bytes = stream.get_u32()?;
        let pm_table = stream.get_u32()?;
        let pm_reserved = stream.get_u32()?;
        if pm_reserved != 0 {
            return Err(QuickDrawError::Malformed("PixMap reserved field must be 0"));
        }

        let map = PixMap{
            row_bytes, bounds, pm_version, pack_type, pack_size, h_res, v_res,
            pixel_type, pixel_size, cmp_count, cmp_size, plane_bytes, pm_table,
        };
        map.validate()?;
        Ok(map)
    }

    fn validate(&self) -> Result<(), QuickDrawError> {
        match self.pixel_type {
            PIXEL_TYPE_INDEXED => {
                match self.pixel_size {
                    1 | 2 | 4 | 8 => {},
                    other => return Err(QuickDrawError::UnsupportedDepth(other)),
                }
                if self.pack_type != PACK_TYPE_DEFAULT || self.pack_size != 0 {
                    return Err(QuickDrawError::UnsupportedPacking(self.pack_type));
                }
                if self.cmp_count != 1 || self.cmp_size != self.pixel_size {
                    return Err(QuickDrawError::Malformed("indexed pixels must have one component"));
                }
            }
            PIXEL_TYPE_RGB_DIRECT => {
                match self.pixel_size {
                    16 => {
                        if self.pack_type != PACK_TYPE_PIXEL_RUN_LENGTH {
                            return Err(QuickDrawError::UnsupportedPacking(self.pack_type));
                        }
                        if self.cmp_count != 3 || self.cmp_size != 5 {
                            return Err(QuickDrawError::Malformed("16-bit direct pixels must have three 5-bit components"));
                        }
                    }
                    32 => {
                        if self.pack_type != PACK_TYPE_COMPONENT_RUN_LENGTH {
                            return Err(QuickDrawError::UnsupportedPacking(self.pack_type));
                        }
                        if (self.cmp_count != 3 && self.cmp_count != 4) || self.cmp_size != 8 {
                            return Err(QuickDrawError::Malformed("32-bit direct pixels must have three or four 8-bit components"));
                        }
                    }
                    other => return Err(QuickDrawError::UnsupportedDepth(other)),
                }
            }
            _ => return Err(QuickDrawError::Malformed("illegal PixMap pixel type")),
        }
        Ok(())
    }

    fn get_packed_row<'a>(&self, stream: &mut Streamer<'a>, bytes_read: &mut usize)
            -> Result<&'a [u8], StreamError> {
        let length = if self.row_bytes <= 250 {
            *bytes_read += 1;
            stream.get_byte()? as usize
        } else {
            *bytes_read += 2;
            stream.get_u16()? as usize
        };
        *bytes_read += length;
        stream.get_bytes(length)
    }

    /// Reads indexed pixel rows: each row is a length-prefixed PackBits run,
    /// decompressed and then expanded pixel_size bits at a time through the
    /// color table.
    pub fn read_packed_rows(&self, stream: &mut Streamer, clut: &ColorTable)
            -> Result<Raster, QuickDrawError> {
        if self.pixel_type != PIXEL_TYPE_INDEXED {
            return Err(QuickDrawError::Malformed("pixel data is not indexed"));
        }
        let mut raster = Raster::new(self.bounds);
        if self.row_bytes == 0 {
            return Ok(raster);
        }
        let width = self.bounds.width().max(0) as usize;
        let depth = self.pixel_size as usize;
        let mask = ((1u16 << depth) - 1) as u8;
        let mut bytes_read = 0;
        let mut row = Vec::with_capacity(self.row_bytes as usize);
        for y in 0..self.bounds.height().max(0) as i32 {
            row.clear();
            let packed = self.get_packed_row(stream, &mut bytes_read)?;
            decompress::unpack_bits(packed, &mut row)?;
            if row.len() * 8 < width * depth {
                return Err(QuickDrawError::Malformed("pixel row shorter than bounds"));
            }
            for x in 0..width {
                let bit = x * depth;
                let value = (row[bit / 8] >> (8 - depth - bit % 8)) & mask;
                raster.set(x as i32 + self.bounds.left as i32,
                           y + self.bounds.top as i32,
                           clut.lookup(value as u16));
            }
        }
        if bytes_read % 2 == 1 {
            stream.get_byte()?;
        }
        Ok(raster)
    }

    /// Reads direct RGB pixel rows: 32-bit pixels are component-interleaved
    /// PackBits runs, 16-bit pixels are word-oriented runs of 5-bit channels.
    pub fn read_direct_rows(&self, stream: &mut Streamer) -> Result<Raster, QuickDrawError> {
        if self.pixel_type != PIXEL_TYPE_RGB_DIRECT {
            return Err(QuickDrawError::Malformed("pixel data is not direct"));
        }
        let mut raster = Raster::new(self.bounds);
        if self.row_bytes == 0 {
            return Ok(raster);
        }
        let width = self.bounds.width().max(0) as usize;
        let mut bytes_read = 0;
        for y in 0..self.bounds.height().max(0) as i32 {
            let packed = self.get_packed_row(stream, &mut bytes_read)?;
            if self.pixel_size == 32 {
                let mut components = Vec::with_capacity(self.cmp_count as usize * width);
                decompress::unpack_bits(packed, &mut components)?;
                if components.len() < self.cmp_count as usize * width {
                    return Err(QuickDrawError::Malformed("pixel row shorter than bounds"));
                }
                // with four components the leading (alpha) plane is skipped
                let red = (self.cmp_count - 3) as usize * width;
                let green = (self.cmp_count - 2) as usize * width;
                let blue = (self.cmp_count - 1) as usize * width;
                for x in 0..width {
                    raster.set(x as i32 + self.bounds.left as i32,
                               y + self.bounds.top as i32,
                               AlphaColor::opaque(components[red + x],
                                                  components[green + x],
                                                  components[blue + x]));
                }
            } else {
                let mut words = Vec::with_capacity(width);
                decompress::unpack_bits_words(packed, &mut words)?;
                if words.len() < width {
                    return Err(QuickDrawError::Malformed("pixel row shorter than bounds"));
                }
                for x in 0..width {
                    let word = words[x];
                    raster.set(x as i32 + self.bounds.left as i32,
                               y + self.bounds.top as i32,
                               AlphaColor::opaque(scale_5_bit((word >> 10) & 0x1f),
                                                  scale_5_bit((word >> 5) & 0x1f),
                                                  scale_5_bit(word & 0x1f)));
                }
            }
        }
        if bytes_read % 2 == 1 {
            stream.get_byte()?;
        }
        Ok(raster)
    }
}

fn scale_5_bit(value: u16) -> u8 {
    ((value << 3) | (value >> 2)) as u8
}

/// A 1-bit bitmap header, as used for the 'cicn' mask and fallback icon.
pub struct BitMap {
    pub row_bytes: u16,
    pub bounds: Rect,
}

impl BitMap {
    pub fn read(stream: &mut Streamer) -> Result<BitMap, QuickDrawError> {
        let base_addr = stream.get_u32()?;
        if base_addr != 0 {
            return Err(QuickDrawError::Malformed("BitMap base address must be 0"));
        }
        let row_bytes = stream.get_u16()?;
        let bounds = Rect::read(stream)?;
        Ok(BitMap{ row_bytes, bounds })
    }

    /// Reads the uncompressed bit rows; rows are padded to row_bytes, which
    /// the classic toolbox kept 16-bit aligned.
    pub fn read_rows(&self, stream: &mut Streamer, on: AlphaColor, off: AlphaColor)
            -> Result<Raster, QuickDrawError> {
        let mut raster = Raster::new(self.bounds);
        if self.row_bytes == 0 {
            return Ok(raster);
        }
        let width = self.bounds.width().max(0) as usize;
        if self.row_bytes as usize * 8 < width {
            return Err(QuickDrawError::Malformed("bitmap rows shorter than bounds"));
        }
        for y in 0..self.bounds.height().max(0) as i32 {
            let row = stream.get_bytes(self.row_bytes as usize)?;
            for x in 0..width {
                let bit = (row[x / 8] >> (7 - x % 8)) & 1;
                raster.set(x as i32 + self.bounds.left as i32,
                           y + self.bounds.top as i32,
                           if bit != 0 { on } else { off });
            }
        }
        Ok(raster)
    }
}
