use std::borrow::Cow;
use std::fmt;

use encoding_rs::{UTF_8, WINDOWS_1252};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Character encodings tried when decoding a delimited text file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// Plain UTF-8. Input starting with a byte-order mark is rejected so the
    /// BOM-aware rung handles it.
    Utf8,
    /// UTF-8 with an optional leading byte-order mark.
    Utf8Sig,
    /// ISO-8859-1: every byte maps to the code point of the same value.
    Latin1,
    Windows1252,
}

impl TextEncoding {
    /// Ordered ladder used for archive entries.
    pub const LADDER: [TextEncoding; 4] = [
        TextEncoding::Utf8,
        TextEncoding::Utf8Sig,
        TextEncoding::Latin1,
        TextEncoding::Windows1252,
    ];

    /// Encoding used by the lenient skip-bad-rows pass.
    pub const FALLBACK: TextEncoding = TextEncoding::Latin1;

    /// Strictly decode `bytes`; `None` if they are not valid in this encoding.
    pub fn decode(self, bytes: &[u8]) -> Option<Cow<'_, str>> {
        match self {
            TextEncoding::Utf8 => {
                if bytes.starts_with(UTF8_BOM) {
                    return None;
                }
                UTF_8.decode_without_bom_handling_and_without_replacement(bytes)
            }
            TextEncoding::Utf8Sig => {
                let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                UTF_8.decode_without_bom_handling_and_without_replacement(body)
            }
            TextEncoding::Latin1 => Some(encoding_rs::mem::decode_latin1(bytes)),
            TextEncoding::Windows1252 => {
                WINDOWS_1252.decode_without_bom_handling_and_without_replacement(bytes)
            }
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Utf8Sig => "utf-8-sig",
            TextEncoding::Latin1 => "latin-1",
            TextEncoding::Windows1252 => "cp1252",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_rejects_invalid_bytes() {
        assert!(TextEncoding::Utf8.decode(b"caf\xE9").is_none());
        assert_eq!(TextEncoding::Utf8.decode("café".as_bytes()).unwrap(), "café");
    }

    #[test]
    fn bom_goes_to_the_sig_rung() {
        let bytes = b"\xEF\xBB\xBFa,b";
        assert!(TextEncoding::Utf8.decode(bytes).is_none());
        assert_eq!(TextEncoding::Utf8Sig.decode(bytes).unwrap(), "a,b");
    }

    #[test]
    fn latin1_decodes_every_byte() {
        assert_eq!(TextEncoding::Latin1.decode(b"caf\xE9").unwrap(), "café");
    }

    #[test]
    fn cp1252_maps_smart_quotes() {
        assert_eq!(
            TextEncoding::Windows1252.decode(b"\x93hi\x94").unwrap(),
            "\u{201C}hi\u{201D}"
        );
    }
}
