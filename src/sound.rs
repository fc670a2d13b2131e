use crate::stream::{StreamError, Streamer};

#[derive(Debug)]
pub enum SoundError {
    Truncated { at: usize },
    UnsupportedFormat(u16),
    UnsupportedSynthCount(u16),
    UnsupportedSynthType(u16),
    UnsupportedInitOptions(u32),
    UnsupportedCommandCount(u16),
    UnsupportedCommand(u16),
    UnsupportedCommandParam(u16),
    UnsupportedEncoding(u8),
}

impl From<StreamError> for SoundError {
    fn from(error: StreamError) -> Self {
        match error {
            StreamError::Truncated{ at } => SoundError::Truncated{ at },
        }
    }
}

const SAMPLED_SYNTH: u16 = 5;
const INIT_CHANNEL_MASK: u32 = 0x00f0;
const BUFFER_CMD: u16 = 0x8051;
const STANDARD_HEADER: u8 = 0;
const SAMPLED_HEADER_LEN: usize = 22;

/// A sampled sound lifted out of a 'snd ' resource's command list. Only the
/// single-bufferCmd shape is interpreted; anything else in the bytecode is an
/// unsupported format.
pub struct Sound {
    pub sample_rate: u32,
    pub channels: i16,
    pub sample_bits: i16,
    pub samples: Vec<u8>,
}

impl Sound {
    pub fn parse(data: &[u8]) -> Result<Sound, SoundError> {
        let mut stream = Streamer::new(data);
        let format = stream.get_u16()?;
        match format {
            1 => {
                let synth_count = stream.get_u16()?;
                if synth_count != 1 {
                    return Err(SoundError::UnsupportedSynthCount(synth_count));
                }
                let synth_type = stream.get_u16()?;
                if synth_type != SAMPLED_SYNTH {
                    return Err(SoundError::UnsupportedSynthType(synth_type));
                }
                let options = stream.get_u32()?;
                if options & INIT_CHANNEL_MASK != options {
                    return Err(SoundError::UnsupportedInitOptions(options));
                }
            }
            2 => {
                stream.skip(2)?; // reference count, unused
            }
            other => return Err(SoundError::UnsupportedFormat(other)),
        }

        let command_count = stream.get_u16()?;
        if command_count != 1 {
            return Err(SoundError::UnsupportedCommandCount(command_count));
        }
        let command = stream.get_u16()?;
        if command != BUFFER_CMD {
            return Err(SoundError::UnsupportedCommand(command));
        }
        let param1 = stream.get_u16()?;
        if param1 != 0 {
            return Err(SoundError::UnsupportedCommandParam(param1));
        }
        let header_offset = stream.get_u32()? as usize;

        stream.seek(header_offset)?;
        let pointer = stream.get_u32()? as usize;
        let sample_count = stream.get_u32()? as usize;
        let rate = stream.get_u32()?;
        stream.skip(8)?; // loop start, loop end
        let encoding = stream.get_byte()?;
        if encoding != STANDARD_HEADER {
            return Err(SoundError::UnsupportedEncoding(encoding));
        }
        stream.get_byte()?; // base frequency

        let samples = stream
            .slice_at(header_offset + SAMPLED_HEADER_LEN + pointer, sample_count)?
            .to_vec();
        Ok(Sound{
            sample_rate: rate >> 16,
            channels: 1,
            sample_bits: 8,
            samples,
        })
    }
}

// IEEE 754 80-bit extended float, as the AIFF COMM chunk wants its sample
// rate. Not correct for zeroes, infinities or NaN, none of which are valid
// sample rates.
fn write_float80(out: &mut Vec<u8>, value: f64) {
    let bits = value.to_bits();
    let sign = bits >> 63;
    let exponent = ((bits >> 52) & 0x7ff).wrapping_sub(1023);
    let fraction = (1u64 << 52) | (bits & ((1u64 << 52) - 1));
    out.extend_from_slice(&((((sign << 15) | (exponent.wrapping_add(16383) & 0x7fff)) as u16).to_be_bytes()));
    out.extend_from_slice(&(fraction << 11).to_be_bytes());
}

fn write_chunk(out: &mut Vec<u8>, name: &[u8; 4], body: &[u8]) {
    out.extend_from_slice(name);
    out.extend_from_slice(&(body.len() as u32).to_be_bytes());
    out.extend_from_slice(body);
}

/// Re-encodes the sound as an AIFF file: a FORM chunk wrapping COMM and SSND.
/// Samples are rebased from 0x80-offset bytes to the signed linear PCM AIFF
/// requires; nothing is resampled.
pub fn aiff(sound: &Sound) -> Vec<u8> {
    let mut comm = Vec::new();
    comm.extend_from_slice(&sound.channels.to_be_bytes());
    comm.extend_from_slice(&(sound.samples.len() as u32).to_be_bytes());
    comm.extend_from_slice(&sound.sample_bits.to_be_bytes());
    write_float80(&mut comm, sound.sample_rate as f64);

    let mut ssnd = Vec::new();
    ssnd.extend_from_slice(&0u32.to_be_bytes()); // offset
    ssnd.extend_from_slice(&0u32.to_be_bytes()); // block size
    for &sample in &sound.samples {
        ssnd.push(sample.wrapping_sub(0x80));
    }

    let mut form = Vec::new();
    form.extend_from_slice(b"AIFF");
    write_chunk(&mut form, b"COMM", &comm);
    write_chunk(&mut form, b"SSND", &ssnd);

    let mut out = Vec::new();
    write_chunk(&mut out, b"FORM", &form);
    out
}
