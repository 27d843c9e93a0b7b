//! Byte decoding and hashing helpers.

use std::borrow::Cow;

/// Decode bytes to a string, handling various encodings.
///
/// 1. UTF-8 (BOM handled by encoding_rs)
/// 2. the hint encoding, usually from [`extract_charset`]
/// 3. Windows-1252, a superset of ISO-8859-1 that old sites still serve
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(name) = hint_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Find a declared charset in the head of a document.
///
/// Looks at `<meta charset=...>`, `<meta http-equiv ... content="...; charset=...">`
/// and the XML declaration, within the first 1024 bytes.
pub fn extract_charset(bytes: &[u8]) -> Option<&str> {
    let prefix = &bytes[..bytes.len().min(1024)];

    if let Some(enc) = extract_xml_encoding(prefix) {
        return Some(enc);
    }

    let pos = prefix
        .windows(8)
        .position(|w| w.eq_ignore_ascii_case(b"charset="))?;
    let after = &prefix[pos + 8..];
    let after = match after.first() {
        Some(b'"') | Some(b'\'') => &after[1..],
        _ => after,
    };
    let end = after
        .iter()
        .position(|&b| !(b.is_ascii_alphanumeric() || b == b'-' || b == b'_'))
        .unwrap_or(after.len());
    if end == 0 {
        return None;
    }

    std::str::from_utf8(&after[..end]).ok()
}

/// Extract the encoding from an XML declaration, if present.
fn extract_xml_encoding(bytes: &[u8]) -> Option<&str> {
    let check_len = bytes.len().min(100);
    let prefix = &bytes[..check_len];

    let xml_start = prefix.windows(5).position(|w| w == b"<?xml")?;
    let after_xml = &prefix[xml_start..];

    let enc_pos = after_xml
        .windows(9)
        .position(|w| w.eq_ignore_ascii_case(b"encoding="))?;
    let after_enc = &after_xml[enc_pos + 9..];

    let quote = *after_enc.first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }

    let value_end = after_enc[1..].iter().position(|&b| b == quote)? + 1;
    std::str::from_utf8(&after_enc[1..value_end]).ok()
}

/// Stable hex digest of a string, used where no readable name exists.
pub fn content_hash(s: &str) -> String {
    sha1_smol::Sha1::from(s).digest().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8() {
        assert_eq!(decode_text("Hello, Wörld".as_bytes(), None), "Hello, Wörld");
    }

    #[test]
    fn test_decode_falls_back_to_windows_1252() {
        assert_eq!(decode_text(b"na\xefve", None), "na\u{ef}ve");
    }

    #[test]
    fn test_extract_meta_charset() {
        assert_eq!(
            extract_charset(b"<html><head><meta charset=\"gbk\"></head>"),
            Some("gbk")
        );
        assert_eq!(
            extract_charset(
                b"<meta http-equiv=\"Content-Type\" content=\"text/html; charset=Shift_JIS\">"
            ),
            Some("Shift_JIS")
        );
        assert_eq!(extract_charset(b"<html><body>no hint</body></html>"), None);
    }

    #[test]
    fn test_extract_xml_encoding() {
        assert_eq!(
            extract_charset(b"<?xml version=\"1.0\" encoding='ISO-8859-1'?><html/>"),
            Some("ISO-8859-1")
        );
    }

    #[test]
    fn test_content_hash_is_stable() {
        let a = content_hash("/html/body/div[2]/p");
        assert_eq!(a, content_hash("/html/body/div[2]/p"));
        assert_ne!(a, content_hash("/html/body/div[1]/p"));
        assert_eq!(a.len(), 40);
    }
}
