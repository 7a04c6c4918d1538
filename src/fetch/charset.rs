//! Charset detection and transcoding for fetched pages.
//!
//! Many sources still serve Shift_JIS or EUC-JP pages, sometimes without
//! declaring it in the `Content-Type` header. Everything handed to
//! extraction code is transcoded to UTF-8 here first.

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use regex::bytes::Regex;
use std::sync::LazyLock;

/// Only the head of a document is searched for a `<meta>` declaration.
const META_SNIFF_LIMIT: usize = 1024;

static META_CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?\s*([a-z0-9_:.\-]+)"#).unwrap()
});

/// Result of decoding a response body.
#[derive(Debug, Clone)]
pub struct Decoded {
    /// The body transcoded to UTF-8
    pub text: String,
    /// The encoding the body was decoded from
    pub encoding: &'static Encoding,
}

/// Decodes `body` into UTF-8 text.
///
/// A byte order mark always wins, followed by the `charset` parameter of
/// `content_type`. With `detect` enabled, a `<meta>` declaration in the
/// document head and finally statistical detection are tried before
/// falling back to UTF-8. Malformed sequences are replaced, never rejected.
///
/// # Arguments
///
/// * `body` - Raw response bytes
/// * `content_type` - Value of the `Content-Type` header, if any
/// * `detect` - Whether to sniff the document when the header is silent
pub fn decode(body: &[u8], content_type: Option<&str>, detect: bool) -> Decoded {
    if let Some((encoding, bom_len)) = Encoding::for_bom(body) {
        return transcode(&body[bom_len..], encoding);
    }

    let encoding = content_type
        .and_then(charset_from_content_type)
        .or_else(|| if detect { sniff_meta(body) } else { None })
        .or_else(|| if detect { Some(guess(body)) } else { None })
        .unwrap_or(UTF_8);

    transcode(body, encoding)
}

/// Extracts the encoding named by a `charset=` parameter.
pub fn charset_from_content_type(content_type: &str) -> Option<&'static Encoding> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        Encoding::for_label(value.trim().trim_matches(|c| c == '"' || c == '\'').as_bytes())
    })
}

fn sniff_meta(body: &[u8]) -> Option<&'static Encoding> {
    let head = &body[..body.len().min(META_SNIFF_LIMIT)];
    let caps = META_CHARSET_RE.captures(head)?;
    let encoding = Encoding::for_label(&caps[1])?;

    // A page that was read as bytes cannot really be UTF-16.
    if encoding == encoding_rs::UTF_16LE || encoding == encoding_rs::UTF_16BE {
        return Some(UTF_8);
    }
    Some(encoding)
}

fn guess(body: &[u8]) -> &'static Encoding {
    let mut detector = EncodingDetector::new();
    detector.feed(body, true);
    detector.guess(None, true)
}

fn transcode(body: &[u8], encoding: &'static Encoding) -> Decoded {
    let (text, _) = encoding.decode_without_bom_handling(body);
    Decoded {
        text: text.into_owned(),
        encoding,
    }
}
