//! Byte decoding for HTML files of unknown encoding.

use encoding_rs::Encoding;
use encoding_rs::UTF_8;

/// How far into the file a `charset` declaration is looked for.
const SNIFF_LIMIT: usize = 8192;

/// Decodes HTML bytes: BOM first, then a `charset` declaration near the top,
/// then UTF-8 with replacement characters.
pub fn decode_html_bytes(bytes: &[u8]) -> String {
    let (encoding, body) = match Encoding::for_bom(bytes) {
        Some((encoding, bom_len)) => (encoding, &bytes[bom_len..]),
        None => (sniff_charset(bytes).unwrap_or(UTF_8), bytes),
    };
    let (text, _) = encoding.decode_without_bom_handling(body);
    text.into_owned()
}

/// Encoding named by the first usable `charset=` in the head of the file,
/// covering both `<meta charset>` and `http-equiv` content types.
fn sniff_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(SNIFF_LIMIT)]);
    let lower = head.to_ascii_lowercase();

    lower
        .match_indices("charset")
        .find_map(|(idx, needle)| {
            let value = lower[idx + needle.len()..].trim_start().strip_prefix('=')?;
            Encoding::for_label(charset_label(value)?.as_bytes())
        })
        // UTF-16 labels in markup mean UTF-8, as browsers treat them.
        .map(Encoding::output_encoding)
}

fn charset_label(value: &str) -> Option<&str> {
    let value = value.trim_start().trim_start_matches(['"', '\'']);
    let end = value
        .find(|ch: char| ch.is_whitespace() || matches!(ch, '"' | '\'' | ';' | '>' | '/'))
        .unwrap_or(value.len());
    let label = &value[..end];
    (!label.is_empty()).then_some(label)
}

#[cfg(test)]
mod tests {
    use super::decode_html_bytes;
    use super::sniff_charset;
    use encoding_rs::UTF_8;
    use encoding_rs::WINDOWS_1252;

    #[test]
    fn prefers_meta_charset() {
        let html = b"<html><head><meta charset=\"windows-1252\"></head><body>caf\xE9</body></html>";
        assert_eq!(sniff_charset(html), Some(WINDOWS_1252));
        assert!(decode_html_bytes(html).contains("caf\u{e9}"));
    }

    #[test]
    fn reads_http_equiv_content_type() {
        // ISO-8859-1 is an alias of windows-1252 in the Encoding Standard.
        let html = b"<meta http-equiv=\"Content-Type\" content=\"text/html; charset=ISO-8859-1\">";
        assert_eq!(sniff_charset(html), Some(WINDOWS_1252));
    }

    #[test]
    fn utf16_declarations_decode_as_utf8() {
        let html = b"<meta charset=utf-16><p>ok</p>";
        assert_eq!(sniff_charset(html), Some(UTF_8));
        assert_eq!(decode_html_bytes(html), "<meta charset=utf-16><p>ok</p>");
    }

    #[test]
    fn strips_utf8_bom() {
        let html = b"\xEF\xBB\xBF<p>\xEC\xA7\x84\xED\x96\x89\xEB\xA5\xA0</p>";
        assert_eq!(decode_html_bytes(html), "<p>\u{c9c4}\u{d589}\u{b960}</p>");
    }

    #[test]
    fn falls_back_to_lossy_utf8() {
        assert_eq!(decode_html_bytes(b"<p>ok\xFF</p>"), "<p>ok\u{fffd}</p>");
    }
}
