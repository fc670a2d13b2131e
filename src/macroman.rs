/// Unicode code points for Mac-Roman bytes 0x80..0xFF. The lower half of the
/// encoding is plain ASCII.
const HIGH_TABLE: [char; 128] = [
    '\u{00c4}', '\u{00c5}', '\u{00c7}', '\u{00c9}', '\u{00d1}', '\u{00d6}', '\u{00dc}', '\u{00e1}',
    '\u{00e0}', '\u{00e2}', '\u{00e4}', '\u{00e3}', '\u{00e5}', '\u{00e7}', '\u{00e9}', '\u{00e8}',
    '\u{00ea}', '\u{00eb}', '\u{00ed}', '\u{00ec}', '\u{00ee}', '\u{00ef}', '\u{00f1}', '\u{00f3}',
    '\u{00f2}', '\u{00f4}', '\u{00f6}', '\u{00f5}', '\u{00fa}', '\u{00f9}', '\u{00fb}', '\u{00fc}',
    '\u{2020}', '\u{00b0}', '\u{00a2}', '\u{00a3}', '\u{00a7}', '\u{2022}', '\u{00b6}', '\u{00df}',
    '\u{00ae}', '\u{00a9}', '\u{2122}', '\u{00b4}', '\u{00a8}', '\u{2260}', '\u{00c6}', '\u{00d8}',
    '\u{221e}', '\u{00b1}', '\u{2264}', '\u{2265}', '\u{00a5}', '\u{00b5}', '\u{2202}', '\u{2211}',
    '\u{220f}', '\u{03c0}', '\u{222b}', '\u{00aa}', '\u{00ba}', '\u{03a9}', '\u{00e6}', '\u{00f8}',
    '\u{00bf}', '\u{00a1}', '\u{00ac}', '\u{221a}', '\u{0192}', '\u{2248}', '\u{2206}', '\u{00ab}',
    '\u{00bb}', '\u{2026}', '\u{00a0}', '\u{00c0}', '\u{00c3}', '\u{00d5}', '\u{0152}', '\u{0153}',
    '\u{2013}', '\u{2014}', '\u{201c}', '\u{201d}', '\u{2018}', '\u{2019}', '\u{00f7}', '\u{25ca}',
    '\u{00ff}', '\u{0178}', '\u{2044}', '\u{20ac}', '\u{2039}', '\u{203a}', '\u{fb01}', '\u{fb02}',
    '\u{2021}', '\u{00b7}', '\u{201a}', '\u{201e}', '\u{2030}', '\u{00c2}', '\u{00ca}', '\u{00c1}',
    '\u{00cb}', '\u{00c8}', '\u{00cd}', '\u{00ce}', '\u{00cf}', '\u{00cc}', '\u{00d3}', '\u{00d4}',
    '\u{f8ff}', '\u{00d2}', '\u{00da}', '\u{00db}', '\u{00d9}', '\u{0131}', '\u{02c6}', '\u{02dc}',
    '\u{00af}', '\u{02d8}', '\u{02d9}', '\u{02da}', '\u{00b8}', '\u{02dd}', '\u{02db}', '\u{02c7}',
];

pub fn decode(bytes: &[u8]) -> String {
    let mut result = String::with_capacity(bytes.len());
    for &byte in bytes {
        if byte < 0x80 {
            result.push(byte as char);
        } else {
            result.push(HIGH_TABLE[(byte & 0x7f) as usize]);
        }
    }
    result
}

/// Replaces the bare carriage returns classic Mac text uses as line endings.
pub fn convert_cr(text: &str, replacement: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch == '\r' {
            result.push_str(replacement);
        } else {
            result.push(ch);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_passes_through() {
        assert_eq!(decode(b"Hello, world"), "Hello, world");
    }

    #[test]
    fn high_bytes_map_through_the_table() {
        let bytes = [
            0xd2, b'A', b'i', b'n', 0xd5, b't', 0xd3, b' ',
            b'a', b'i', b'n', 0xd5, b't', b' ', 0x8c, b'i',
            b'n', 0xd5, b't', b'.',
        ];
        assert_eq!(decode(&bytes), "\u{201c}Ain\u{2019}t\u{201d} ain\u{2019}t \u{e5}in\u{2019}t.");
    }

    #[test]
    fn cr_conversion() {
        assert_eq!(convert_cr("1\r2\r3\r", "\n"), "1\n2\n3\n");
        assert_eq!(convert_cr("1\r2\r3\r", "\r\n"), "1\r\n2\r\n3\r\n");
        assert_eq!(convert_cr("1\r2\r3\r", "\r"), "1\r2\r3\r");
        // already-converted text is left alone
        assert_eq!(convert_cr("1\n2\n3\n", "\n"), "1\n2\n3\n");
    }
}
