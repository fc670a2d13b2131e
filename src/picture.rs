use num_enum::TryFromPrimitive;
use std::convert::TryFrom;
use log::{debug, warn};

use crate::clut::ColorTable;
use crate::image::Raster;
use crate::quickdraw::{PixMap, QuickDrawError, Rect};
use crate::stream::{StreamError, Streamer};

#[derive(Debug)]
pub enum PictureError {
    Truncated { at: usize },
    UnsupportedVersion(u8),
    BadHeader(&'static str),
    FrameMismatch { frame: Rect, header: Rect },
    UnknownOpcodeLength { opcode: u16, at: usize },
    NonRectangularClip(u16),
    UnsupportedTransferMode(i16),
    UnsupportedScaling { src: Rect, dst: Rect },
    QuickDraw(QuickDrawError),
    Encode(png::EncodingError),
}

impl From<StreamError> for PictureError {
    fn from(error: StreamError) -> Self {
        match error {
            StreamError::Truncated{ at } => PictureError::Truncated{ at },
        }
    }
}

impl From<QuickDrawError> for PictureError {
    fn from(error: QuickDrawError) -> Self {
        PictureError::QuickDraw(error)
    }
}

impl From<png::EncodingError> for PictureError {
    fn from(error: png::EncodingError) -> Self {
        PictureError::Encode(error)
    }
}

const SRC_COPY: i16 = 0;
const DITHER_FLAG: i16 = 0x0040;
const RECT_REGION_SIZE: u16 = 0x000a;

const HEADER_VERSION_2: u16 = 0xffff;
const HEADER_VERSION_2_EXTENDED: u16 = 0xfffe;
const RESOLUTION_72_DPI: u32 = 0x0048_0000;

// version 1 byte opcodes
const NOOP_V1: u8 = 0x00;
const PIC_VERSION_V1: u8 = 0x11;

#[derive(TryFromPrimitive, Debug, Clone, Copy, PartialEq)]
#[repr(u16)]
pub enum PicOp {
    NoOp = 0x0000,
    Clip = 0x0001,
    PenSize = 0x0007,
    ForegroundColor = 0x001a,
    BackgroundColor = 0x001b,
    DefaultHilite = 0x001e,
    OpColor = 0x001f,
    ShortLine = 0x0022,
    FrameRect = 0x0030,
    PaintRect = 0x0031,
    FrameSameRect = 0x0038,
    PaintSameRect = 0x0039,
    FrameOval = 0x0050,
    PaintOval = 0x0051,
    FrameSameOval = 0x0058,
    PaintSameOval = 0x0059,
    FrameArc = 0x0060,
    PaintArc = 0x0061,
    FrameSameArc = 0x0068,
    PaintSameArc = 0x0069,
    FramePoly = 0x0070,
    PaintPoly = 0x0071,
    PackBitsRect = 0x0098,
    DirectBitsRect = 0x009a,
    ShortComment = 0x00a0,
    LongComment = 0x00a1,
    End = 0x00ff,
    HeaderOp = 0x0c00,
}

fn round_up_even(value: usize) -> usize {
    (value + 1) & !1
}

pub struct Picture {
    pub version: u8,
    pub frame: Rect,
    raster: Raster,
    vector_ops: bool,
}

struct Interpreter<'a> {
    stream: Streamer<'a>,
    frame: Rect,
    clip: Rect,
    raster: Raster,
    vector_ops: bool,
}

impl Picture {
    /// Interprets a 'PICT' resource payload: the leading size word and frame
    /// rectangle, then the version 1 opcode stream, which for version 2
    /// pictures immediately escapes into the word-opcode stream.
    pub fn parse(data: &[u8]) -> Result<Picture, PictureError> {
        let mut stream = Streamer::new(data);
        stream.skip(2)?; // resource-era size field, not trustworthy
        let frame = Rect::read(&mut stream)?;

        let mut interp = Interpreter{
            stream,
            frame,
            clip: frame,
            raster: Raster::new(frame),
            vector_ops: false,
        };
        let version = interp.run_version_1()?;
        if interp.vector_ops {
            warn!("picture contains vector opcodes; only raster content is decoded");
        }
        Ok(Picture{ version, frame, raster: interp.raster, vector_ops: interp.vector_ops })
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn has_vector_ops(&self) -> bool {
        self.vector_ops
    }

    pub fn png(&self) -> Result<Vec<u8>, PictureError> {
        if self.version != 2 {
            return Err(PictureError::UnsupportedVersion(self.version));
        }
        Ok(self.raster.encode_png()?)
    }
}

impl<'a> Interpreter<'a> {
    fn run_version_1(&mut self) -> Result<u8, PictureError> {
        while !self.stream.end_of_stream() {
            let at = self.stream.position();
            let op = self.stream.get_byte()?;
            match op {
                NOOP_V1 => {},
                PIC_VERSION_V1 => {
                    let version = self.stream.get_byte()?;
                    match version {
                        0x01 => return Ok(1),
                        0x02 => {
                            if self.stream.get_byte()? != 0xff {
                                return Err(PictureError::BadHeader("bad version 2 marker"));
                            }
                            self.run_version_2()?;
                            return Ok(2);
                        }
                        other => return Err(PictureError::UnsupportedVersion(other)),
                    }
                }
                other => {
                    return Err(PictureError::UnknownOpcodeLength{ opcode: other as u16, at });
                }
            }
        }
        Ok(0)
    }

    fn read_header(&mut self) -> Result<(), PictureError> {
        if self.stream.get_u16()? != PicOp::HeaderOp as u16 {
            return Err(PictureError::BadHeader("missing version 2 header opcode"));
        }
        let bounds;
        match self.stream.get_u16()? {
            HEADER_VERSION_2 => {
                self.stream.skip(2)?;
                let left = (self.stream.get_u32()? / 65536) as i16;
                let top = (self.stream.get_u32()? / 65536) as i16;
                let right = (self.stream.get_u32()? / 65536) as i16;
                let bottom = (self.stream.get_u32()? / 65536) as i16;
                bounds = Rect{ top, left, bottom, right };
                self.stream.skip(4)?;
            }
            HEADER_VERSION_2_EXTENDED => {
                self.stream.skip(2)?;
                if self.stream.get_u32()? != RESOLUTION_72_DPI {
                    return Err(PictureError::BadHeader("horizontal resolution is not 72 dpi"));
                }
                if self.stream.get_u32()? != RESOLUTION_72_DPI {
                    return Err(PictureError::BadHeader("vertical resolution is not 72 dpi"));
                }
                bounds = Rect::read(&mut self.stream)?;
                self.stream.skip(2)?;
            }
            _ => return Err(PictureError::BadHeader("unrecognized version 2 header")),
        }
        if bounds != self.frame {
            return Err(PictureError::FrameMismatch{ frame: self.frame, header: bounds });
        }
        Ok(())
    }

    fn run_version_2(&mut self) -> Result<(), PictureError> {
        self.read_header()?;
        loop {
            let at = self.stream.position();
            let op = self.stream.get_u16()?;
            match PicOp::try_from(op) {
                Ok(PicOp::NoOp) | Ok(PicOp::DefaultHilite) => {},
                Ok(PicOp::PenSize) => self.stream.skip(4)?,
                Ok(PicOp::ForegroundColor) | Ok(PicOp::BackgroundColor) | Ok(PicOp::OpColor) => {
                    self.stream.skip(6)?;
                }
                Ok(PicOp::ShortLine) => self.skip_vector(6)?,
                Ok(PicOp::FrameRect) | Ok(PicOp::PaintRect)
                | Ok(PicOp::FrameOval) | Ok(PicOp::PaintOval) => self.skip_vector(8)?,
                Ok(PicOp::FrameSameRect) | Ok(PicOp::PaintSameRect)
                | Ok(PicOp::FrameSameOval) | Ok(PicOp::PaintSameOval) => self.skip_vector(0)?,
                Ok(PicOp::FrameArc) | Ok(PicOp::PaintArc) => self.skip_vector(12)?,
                Ok(PicOp::FrameSameArc) | Ok(PicOp::PaintSameArc) => self.skip_vector(4)?,
                Ok(PicOp::FramePoly) | Ok(PicOp::PaintPoly) => {
                    let length = self.stream.get_u16()? as usize;
                    self.skip_vector(round_up_even(length.saturating_sub(2)))?;
                }
                Ok(PicOp::ShortComment) => self.stream.skip(2)?,
                Ok(PicOp::LongComment) => {
                    self.stream.skip(2)?;
                    let length = self.stream.get_u16()? as usize;
                    self.stream.skip(round_up_even(length))?;
                }
                Ok(PicOp::Clip) => {
                    let size = self.stream.get_u16()?;
                    if size != RECT_REGION_SIZE {
                        return Err(PictureError::NonRectangularClip(size));
                    }
                    self.clip = Rect::read(&mut self.stream)?;
                }
                Ok(PicOp::PackBitsRect) => self.pack_bits_rect()?,
                Ok(PicOp::DirectBitsRect) => self.direct_bits_rect()?,
                Ok(PicOp::HeaderOp) => self.stream.skip(24)?,
                Ok(PicOp::End) => break,
                Err(_) => self.skip_reserved(op, at)?,
            }
        }
        Ok(())
    }

    fn skip_vector(&mut self, length: usize) -> Result<(), PictureError> {
        self.vector_ops = true;
        self.stream.skip(length)?;
        Ok(())
    }

    // Reserved opcodes carry their data length in their number; anything
    // below 0x0100 we do not know has no derivable length, and guessing
    // would desynchronize the stream.
    fn skip_reserved(&mut self, opcode: u16, at: usize) -> Result<(), PictureError> {
        if (0x0100..0x8000).contains(&opcode) {
            debug!("skipping reserved opcode {:#06x}", opcode);
            self.stream.skip(2 * (opcode >> 8) as usize)?;
            Ok(())
        } else if (0x8000..0x8100).contains(&opcode) {
            debug!("skipping reserved opcode {:#06x}", opcode);
            Ok(())
        } else if opcode >= 0x8100 {
            debug!("skipping reserved opcode {:#06x}", opcode);
            let length = self.stream.get_u32()? as usize;
            self.stream.skip(length)?;
            Ok(())
        } else {
            Err(PictureError::UnknownOpcodeLength{ opcode, at })
        }
    }

    fn check_blit(&self, src: Rect, dst: Rect, mode: i16) -> Result<(), PictureError> {
        if mode != SRC_COPY {
            return Err(PictureError::UnsupportedTransferMode(mode));
        }
        if !src.same_size(&dst) {
            return Err(PictureError::UnsupportedScaling{ src, dst });
        }
        Ok(())
    }

    fn pack_bits_rect(&mut self) -> Result<(), PictureError> {
        let map = PixMap::read(&mut self.stream)?;
        let clut = ColorTable::read(&mut self.stream)?;
        let src_rect = Rect::read(&mut self.stream)?;
        let dst_rect = Rect::read(&mut self.stream)?;
        let mode = self.stream.get_i16()?;
        self.check_blit(src_rect, dst_rect, mode)?;
        let image = map.read_packed_rows(&mut self.stream, &clut)?;
        self.raster.blit_rect(&image, src_rect, dst_rect, self.clip);
        Ok(())
    }

    fn direct_bits_rect(&mut self) -> Result<(), PictureError> {
        self.stream.skip(4)?; // pixel map base address
        let map = PixMap::read(&mut self.stream)?;
        let src_rect = Rect::read(&mut self.stream)?;
        let dst_rect = Rect::read(&mut self.stream)?;
        let mode = self.stream.get_i16()? & !DITHER_FLAG;
        self.check_blit(src_rect, dst_rect, mode)?;
        let image = map.read_direct_rows(&mut self.stream)?;
        self.raster.blit_rect(&image, src_rect, dst_rect, self.clip);
        Ok(())
    }
}
