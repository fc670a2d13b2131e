use crate::stream::{StreamError, Streamer};

/// PackBits run-length decoding: a header byte below 0x80 introduces
/// header+1 literal bytes, a header byte of 0x80 or above repeats the next
/// byte 0x101-header times.
pub fn unpack_bits(input: &[u8], output: &mut Vec<u8>) -> Result<(), StreamError> {
    let mut stream = Streamer::new(input);
    while !stream.end_of_stream() {
        let header = stream.get_byte()?;
        if header >= 0x80 {
            let value = stream.get_byte()?;
            for _ in 0..0x101 - header as usize {
                output.push(value);
            }
        } else {
            output.extend_from_slice(stream.get_bytes(header as usize + 1)?);
        }
    }
    Ok(())
}

/// Word-oriented PackBits, as used by 16-bit direct pixel rows: run lengths
/// count 16-bit values, not bytes.
pub fn unpack_bits_words(input: &[u8], output: &mut Vec<u16>) -> Result<(), StreamError> {
    let mut stream = Streamer::new(input);
    while !stream.end_of_stream() {
        let header = stream.get_byte()?;
        if header >= 0x80 {
            let value = stream.get_u16()?;
            for _ in 0..0x101 - header as usize {
                output.push(value);
            }
        } else {
            for _ in 0..header as usize + 1 {
                output.push(stream.get_u16()?);
            }
        }
    }
    Ok(())
}
