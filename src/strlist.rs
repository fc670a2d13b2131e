use crate::macroman;
use crate::stream::{StreamError, Streamer};

#[derive(Debug)]
pub enum StringListError {
    Truncated { at: usize },
    TrailingBytes(usize),
}

impl From<StreamError> for StringListError {
    fn from(error: StreamError) -> Self {
        match error {
            StreamError::Truncated{ at } => StringListError::Truncated{ at },
        }
    }
}

/// A 'STR#' resource: a counted list of Pascal strings in Mac-Roman.
pub struct StringList {
    pub strings: Vec<String>,
}

impl StringList {
    pub fn parse(data: &[u8]) -> Result<StringList, StringListError> {
        let mut stream = Streamer::new(data);
        let count = stream.get_u16()?;
        let mut strings = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let length = stream.get_byte()?;
            strings.push(macroman::decode(stream.get_bytes(length as usize)?));
        }
        if !stream.end_of_stream() {
            return Err(StringListError::TrailingBytes(stream.remaining()));
        }
        Ok(StringList{ strings })
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(
            self.strings.iter().map(|s| serde_json::Value::String(s.clone())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&5u16.to_be_bytes());
        for string in &["STR#", "String", "List", "resource", "type"] {
            data.push(string.len() as u8);
            data.extend_from_slice(string.as_bytes());
        }
        data
    }

    #[test]
    fn strings_keep_source_order() {
        let list = StringList::parse(&fixture()).unwrap();
        assert_eq!(list.strings, vec!["STR#", "String", "List", "resource", "type"]);
        let text = serde_json::to_string_pretty(&list.to_json()).unwrap();
        assert_eq!(text, "[\n  \"STR#\",\n  \"String\",\n  \"List\",\n  \"resource\",\n  \"type\"\n]");
    }

    #[test]
    fn short_string_data_fails() {
        let mut data = fixture();
        data.truncate(data.len() - 2);
        match StringList::parse(&data) {
            Err(StringListError::Truncated{ .. }) => {},
            _ => panic!("truncated list should not parse"),
        }
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut data = fixture();
        data.extend_from_slice(b"xy");
        match StringList::parse(&data) {
            Err(StringListError::TrailingBytes(2)) => {},
            _ => panic!("trailing bytes should not parse"),
        }
    }
}
