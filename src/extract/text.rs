use std::borrow::Cow;

use encoding_rs::WINDOWS_1252;

use super::Extraction;

const BOM: &str = "\u{feff}";

pub fn decode(data: &[u8]) -> String {
    let decoded = match std::str::from_utf8(data) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => WINDOWS_1252.decode_without_bom_handling(data).0,
    };

    match decoded.strip_prefix(BOM) {
        Some(stripped) => stripped.to_owned(),
        None => decoded.into_owned(),
    }
}

pub fn extract(data: &[u8]) -> Extraction {
    Extraction::from_text(decode(data))
}
