use serde_json::json;
use std::collections::BTreeMap;

use crate::image::AlphaColor;
use crate::stream::{StreamError, Streamer};

#[derive(Debug)]
pub enum ClutError {
    Truncated { at: usize },
    TrailingBytes(usize),
}

impl From<StreamError> for ClutError {
    fn from(error: StreamError) -> Self {
        match error {
            StreamError::Truncated{ at } => ClutError::Truncated{ at },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub red: u16,
    pub green: u16,
    pub blue: u16,
}

/// A color lookup table. Entries are keyed by their stored index field, which
/// need not be contiguous or sorted; a duplicate index overwrites the earlier
/// entry.
pub struct ColorTable {
    pub seed: u32,
    pub flags: u16,
    table: BTreeMap<u16, Color>,
}

impl ColorTable {
    /// Reads a color table mid-stream, as embedded in 'PICT' and 'cicn' data.
    pub fn read(stream: &mut Streamer) -> Result<ColorTable, StreamError> {
        let seed = stream.get_u32()?;
        let flags = stream.get_u16()?;
        let size = stream.get_u16()?;
        let mut table = BTreeMap::new();
        for _ in 0..size as u32 + 1 {
            let index = stream.get_u16()?;
            let red = stream.get_u16()?;
            let green = stream.get_u16()?;
            let blue = stream.get_u16()?;
            table.insert(index, Color{ red, green, blue });
        }
        Ok(ColorTable{ seed, flags, table })
    }

    /// Parses a standalone 'clut' resource, which must contain nothing else.
    pub fn parse(data: &[u8]) -> Result<ColorTable, ClutError> {
        let mut stream = Streamer::new(data);
        let table = ColorTable::read(&mut stream)?;
        if !stream.end_of_stream() {
            return Err(ClutError::TrailingBytes(stream.remaining()));
        }
        Ok(table)
    }

    /// Indexed-pixel lookup; an index with no entry is transparent.
    pub fn lookup(&self, index: u16) -> AlphaColor {
        match self.table.get(&index) {
            Some(color) => AlphaColor::opaque(
                (color.red >> 8) as u8, (color.green >> 8) as u8, (color.blue >> 8) as u8),
            None => AlphaColor::clear(),
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut object = serde_json::Map::new();
        for (index, color) in &self.table {
            object.insert(index.to_string(), json!({
                "red": color.red,
                "green": color.green,
                "blue": color.blue,
            }));
        }
        serde_json::Value::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(index: u16, red: u16, green: u16, blue: u16) -> Vec<u8> {
        let mut bytes = Vec::new();
        for value in &[index, red, green, blue] {
            bytes.extend_from_slice(&value.to_be_bytes());
        }
        bytes
    }

    fn fixture() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&0u32.to_be_bytes()); // seed
        data.extend_from_slice(&0u16.to_be_bytes()); // flags
        data.extend_from_slice(&2u16.to_be_bytes()); // size (entries - 1)
        data.extend(entry(0, 65535, 0, 0));
        data.extend(entry(1, 0, 65535, 0));
        data.extend(entry(2, 0, 0, 65535));
        data
    }

    #[test]
    fn lookup_is_by_index_not_position() {
        let mut data = Vec::new();
        data.extend_from_slice(&0u32.to_be_bytes());
        data.extend_from_slice(&0u16.to_be_bytes());
        data.extend_from_slice(&1u16.to_be_bytes());
        data.extend(entry(7, 65535, 0, 0));
        data.extend(entry(7, 0, 65535, 0)); // duplicate index: last wins
        let clut = ColorTable::parse(&data).unwrap();
        assert_eq!(clut.len(), 1);
        assert_eq!(clut.lookup(7), AlphaColor::opaque(0, 255, 0));
        assert_eq!(clut.lookup(0), AlphaColor::clear());
    }

    #[test]
    fn json_fields_are_alphabetical() {
        let clut = ColorTable::parse(&fixture()).unwrap();
        let text = serde_json::to_string_pretty(&clut.to_json()).unwrap();
        assert_eq!(text, "{\n  \"0\": {\n    \"blue\": 0,\n    \"green\": 0,\n    \"red\": 65535\n  },\n  \"1\": {\n    \"blue\": 0,\n    \"green\": 65535,\n    \"red\": 0\n  },\n  \"2\": {\n    \"blue\": 65535,\n    \"green\": 0,\n    \"red\": 0\n  }\n}");
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut data = fixture();
        data.push(0);
        match ColorTable::parse(&data) {
            Err(ClutError::TrailingBytes(1)) => {},
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }
}
