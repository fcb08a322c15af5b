use encoding_rs::{BIG5, UTF_16BE};
use lopdf::Document;

const UTF16_BOM: [u8; 2] = [0xFE, 0xFF];

/// Marker lopdf leaves in place of text from fonts it cannot map.
const UNMAPPED_FONT: &str = "?Identity-H Unimplemented?";

/// Whether decoded text is mostly replacement or control characters.
pub(crate) fn is_garbled(text: &str) -> bool {
    if text.contains(UNMAPPED_FONT) {
        return true;
    }

    let (mut total, mut replaced, mut control) = (0_usize, 0_usize, 0_usize);
    for ch in text.chars() {
        total += 1;
        if ch == char::REPLACEMENT_CHARACTER {
            replaced += 1;
        } else if ch.is_control() && !matches!(ch, '\n' | '\r' | '\t') {
            control += 1;
        }
    }

    total > 0 && (replaced * 8 > total || control * 5 > total)
}

fn utf16(bytes: &[u8]) -> Option<String> {
    let (text, had_errors) = UTF_16BE.decode_without_bom_handling(bytes);
    (!had_errors && !text.is_empty()).then(|| text.into_owned())
}

fn big5(bytes: &[u8]) -> Option<String> {
    let (text, _, had_errors) = BIG5.decode(bytes);
    (!had_errors && !text.is_empty()).then(|| text.into_owned())
}

fn hints_utf16(encoding: &str) -> bool {
    ["utf16", "ucs2", "identity-h", "unicode"]
        .iter()
        .any(|hint| encoding.contains(hint))
}

fn hints_big5(encoding: &str) -> bool {
    ["big5", "b5", "eten"].iter().any(|hint| encoding.contains(hint))
}

/// Decodes a string operand with the font's declared encoding, retrying
/// UTF-16 and Big5 when that yields garbage.
pub(crate) fn decode_string(encoding: Option<&str>, bytes: &[u8]) -> String {
    let declared = Document::decode_text(encoding, bytes);
    if !is_garbled(&declared) {
        return declared;
    }

    let hint = encoding.map(str::to_ascii_lowercase).unwrap_or_default();
    bytes
        .strip_prefix(&UTF16_BOM)
        .and_then(utf16)
        .or_else(|| hints_utf16(&hint).then(|| utf16(bytes)).flatten())
        .or_else(|| hints_big5(&hint).then(|| big5(bytes)).flatten())
        .unwrap_or_else(|| String::from_utf8_lossy(bytes).into_owned())
}
