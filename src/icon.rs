use crate::clut::ColorTable;
use crate::image::{AlphaColor, Raster};
use crate::quickdraw::{BitMap, PixMap, QuickDrawError};
use crate::stream::{StreamError, Streamer};

#[derive(Debug)]
pub enum IconError {
    Truncated { at: usize },
    TrailingBytes(usize),
    QuickDraw(QuickDrawError),
    Encode(png::EncodingError),
}

impl From<StreamError> for IconError {
    fn from(error: StreamError) -> Self {
        match error {
            StreamError::Truncated{ at } => IconError::Truncated{ at },
        }
    }
}

impl From<QuickDrawError> for IconError {
    fn from(error: QuickDrawError) -> Self {
        IconError::QuickDraw(error)
    }
}

impl From<png::EncodingError> for IconError {
    fn from(error: png::EncodingError) -> Self {
        IconError::Encode(error)
    }
}

/// A 'cicn' color icon: a color pixel map, a 1-bit transparency mask and a
/// 1-bit fallback icon, composited into one RGBA raster.
pub struct ColorIcon {
    raster: Raster,
}

impl ColorIcon {
    pub fn parse(data: &[u8]) -> Result<ColorIcon, IconError> {
        let mut stream = Streamer::new(data);
        stream.skip(4)?; // pixel map handle placeholder
        let pixmap = PixMap::read(&mut stream)?;
        let mask_map = BitMap::read(&mut stream)?;
        let icon_map = BitMap::read(&mut stream)?;
        stream.skip(4)?; // icon data handle placeholder

        let black = AlphaColor::opaque(0, 0, 0);
        let white = AlphaColor::opaque(255, 255, 255);
        let mask = mask_map.read_rows(&mut stream, black, AlphaColor::clear())?;
        let icon = icon_map.read_rows(&mut stream, black, white)?;
        let clut = ColorTable::read(&mut stream)?;

        let mut raster = Raster::new(pixmap.bounds);
        if pixmap.row_bytes == 0 {
            // degenerate pixel map: fall back to the 1-bit icon, opaque only
            // where both the mask and the icon bit are set
            let bounds = pixmap.bounds;
            for y in bounds.top as i32..bounds.bottom as i32 {
                for x in bounds.left as i32..bounds.right as i32 {
                    if mask.get(x, y).alpha != 0 && icon.get(x, y) == black {
                        raster.set(x, y, black);
                    }
                }
            }
        } else {
            let pixels = pixmap.read_packed_rows(&mut stream, &clut)?;
            raster.composite(&pixels, &mask);
        }

        if stream.remaining() > 1 {
            return Err(IconError::TrailingBytes(stream.remaining()));
        }
        Ok(ColorIcon{ raster })
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn png(&self) -> Result<Vec<u8>, IconError> {
        Ok(self.raster.encode_png()?)
    }
}
