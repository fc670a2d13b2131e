use crate::quickdraw::Rect;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AlphaColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl AlphaColor {
    pub fn opaque(red: u8, green: u8, blue: u8) -> AlphaColor {
        AlphaColor{ red, green, blue, alpha: 255 }
    }

    pub fn clear() -> AlphaColor {
        AlphaColor{ red: 0, green: 0, blue: 0, alpha: 0 }
    }
}

/// Row-major RGBA pixel buffer addressed in the coordinate space of its
/// bounds rectangle, as QuickDraw pixel maps are.
pub struct Raster {
    bounds: Rect,
    pixels: Vec<AlphaColor>,
}

impl Raster {
    pub fn new(bounds: Rect) -> Raster {
        let size = bounds.width().max(0) as usize * bounds.height().max(0) as usize;
        Raster{ bounds, pixels: vec![AlphaColor::clear(); size] }
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.bounds.left as i32 && x < self.bounds.right as i32
            && y >= self.bounds.top as i32 && y < self.bounds.bottom as i32
    }

    fn index(&self, x: i32, y: i32) -> usize {
        let x = x - self.bounds.left as i32;
        let y = y - self.bounds.top as i32;
        y as usize * self.bounds.width() as usize + x as usize
    }

    pub fn set(&mut self, x: i32, y: i32, color: AlphaColor) {
        if self.contains(x, y) {
            let index = self.index(x, y);
            self.pixels[index] = color;
        }
    }

    pub fn get(&self, x: i32, y: i32) -> AlphaColor {
        if self.contains(x, y) {
            self.pixels[self.index(x, y)]
        } else {
            AlphaColor::clear()
        }
    }

    /// Copies an equal-sized rectangle of `src` into this raster. Every pixel
    /// of the destination rectangle is written, including transparent ones.
    pub fn blit_rect(&mut self, src: &Raster, src_rect: Rect, dst_rect: Rect, clip: Rect) {
        let dx = dst_rect.left as i32 - src_rect.left as i32;
        let dy = dst_rect.top as i32 - src_rect.top as i32;
        let area = Rect::intersect(dst_rect, clip);
        for y in area.top as i32..area.bottom as i32 {
            for x in area.left as i32..area.right as i32 {
                self.set(x, y, src.get(x - dx, y - dy));
            }
        }
    }

    /// Copies `src` pixels wherever `mask` is opaque; everything else is left
    /// untouched.
    pub fn composite(&mut self, src: &Raster, mask: &Raster) {
        let area = Rect::intersect(Rect::intersect(src.bounds, mask.bounds), self.bounds);
        for y in area.top as i32..area.bottom as i32 {
            for x in area.left as i32..area.right as i32 {
                if mask.get(x, y).alpha != 0 {
                    let color = src.get(x, y);
                    self.set(x, y, color);
                }
            }
        }
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, png::EncodingError> {
        let width = self.bounds.width().max(0) as u32;
        let height = self.bounds.height().max(0) as u32;
        let mut data = Vec::with_capacity(self.pixels.len() * 4);
        for pixel in &self.pixels {
            data.push(pixel.red);
            data.push(pixel.green);
            data.push(pixel.blue);
            data.push(pixel.alpha);
        }
        let mut output = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut output, width, height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header()?;
            writer.write_image_data(&data)?;
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(top: i16, left: i16, bottom: i16, right: i16) -> Rect {
        Rect{ top, left, bottom, right }
    }

    #[test]
    fn set_and_get_respect_bounds() {
        let mut raster = Raster::new(rect(0, 0, 2, 2));
        let red = AlphaColor::opaque(255, 0, 0);
        raster.set(1, 1, red);
        raster.set(5, 5, red); // silently outside
        assert_eq!(raster.get(1, 1), red);
        assert_eq!(raster.get(0, 0), AlphaColor::clear());
        assert_eq!(raster.get(5, 5), AlphaColor::clear());
    }

    #[test]
    fn blit_translates_and_clips() {
        let mut src = Raster::new(rect(0, 0, 2, 2));
        let green = AlphaColor::opaque(0, 255, 0);
        src.set(0, 0, green);
        src.set(1, 1, green);

        let mut dst = Raster::new(rect(0, 0, 4, 4));
        dst.blit_rect(&src, rect(0, 0, 2, 2), rect(2, 2, 4, 4), rect(0, 0, 4, 3));
        assert_eq!(dst.get(2, 2), green);
        // (3, 3) maps to src (1, 1) but the clip rect ends at x=3
        assert_eq!(dst.get(3, 3), AlphaColor::clear());
    }

    #[test]
    fn png_round_trips() {
        let mut raster = Raster::new(rect(0, 0, 1, 2));
        raster.set(0, 0, AlphaColor::opaque(255, 0, 0));
        raster.set(1, 0, AlphaColor{ red: 0, green: 0, blue: 255, alpha: 128 });
        let encoded = raster.encode_png().unwrap();

        let decoder = png::Decoder::new(&encoded[..]);
        let mut reader = decoder.read_info().unwrap();
        let mut buffer = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buffer).unwrap();
        assert_eq!((info.width, info.height), (2, 1));
        assert_eq!(info.color_type, png::ColorType::Rgba);
        assert_eq!(&buffer[..info.buffer_size()], &[255, 0, 0, 255, 0, 0, 255, 128]);
    }

    #[test]
    fn composite_honours_mask() {
        let mut src = Raster::new(rect(0, 0, 2, 1));
        let blue = AlphaColor::opaque(0, 0, 255);
        src.set(0, 0, blue);
        src.set(1, 0, blue);
        let mut mask = Raster::new(rect(0, 0, 2, 1));
        mask.set(0, 0, AlphaColor::opaque(0, 0, 0));

        let mut dst = Raster::new(rect(0, 0, 2, 1));
        dst.composite(&src, &mask);
        assert_eq!(dst.get(0, 0), blue);
        assert_eq!(dst.get(1, 0), AlphaColor::clear());
    }
}
