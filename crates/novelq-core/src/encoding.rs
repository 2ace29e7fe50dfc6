//! Encoding detection for untagged text files.
//!
//! A statistical guess over the first MiB decides the encoding when it is
//! confident; otherwise a fixed list of encodings common in Chinese-language
//! novels is tried in order. Decoding is always strict: a single malformed
//! sequence rejects the candidate, nothing is ever replaced with U+FFFD.

use crate::error::{DocumentError, Result};
use encoding_rs::{BIG5, Encoding, GB18030, GBK, UTF_8, UTF_16BE, UTF_16LE};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// How many leading bytes the guesser looks at.
pub const SAMPLE_LIMIT: usize = 1024 * 1024;

/// Guesses at or below this confidence are ignored.
pub const CONFIDENCE_THRESHOLD: f32 = 0.7;

/// Tried in order when the guess is missing, weak, or wrong.
pub const FALLBACK_ENCODINGS: [&str; 9] = [
    "utf-8",
    "gbk",
    "gb2312",
    "gb18030",
    "big5",
    "utf-16",
    "utf-16-le",
    "utf-16-be",
    "ascii",
];

/// Decoded file contents together with the encoding that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: String,
}

/// Read `path` and decode it, guessing the encoding first.
pub fn detect_and_decode(path: &Path) -> Result<DecodedText> {
    let bytes = fs::read(path).map_err(|err| read_error(path, err))?;
    let guess = guess_encoding(&bytes[..bytes.len().min(SAMPLE_LIMIT)]);
    decode_guessed(path, &bytes, guess)
}

/// Decode with `guess` when it is confident and valid, otherwise walk the
/// fallback list. `path` only names the file in logs and errors.
fn decode_guessed(path: &Path, bytes: &[u8], guess: Option<(String, f32)>) -> Result<DecodedText> {
    if let Some((label, confidence)) = guess {
        debug!(
            path = %path.display(),
            guess = %label,
            confidence,
            "Encoding guess"
        );
        if confidence > CONFIDENCE_THRESHOLD {
            if let Some(text) = decode_bytes(bytes, &label) {
                info!(path = %path.display(), encoding = %label, "Decoded with detected encoding");
                return Ok(DecodedText {
                    text,
                    encoding: label,
                });
            }
            debug!(guess = %label, "Detected encoding failed to decode the full file");
        }
    }

    let decoded =
        decode_with_fallbacks(bytes).ok_or_else(|| DocumentError::Decode(path.to_path_buf()))?;
    info!(
        path = %path.display(),
        encoding = %decoded.encoding,
        "Decoded with fallback encoding"
    );
    Ok(decoded)
}

/// Run the statistical guesser; returns a lower-cased label and its confidence.
pub fn guess_encoding(sample: &[u8]) -> Option<(String, f32)> {
    if sample.is_empty() {
        return None;
    }
    let (charset, confidence, _language) = chardet::detect(sample);
    let label = charset.trim().to_ascii_lowercase();
    if label.is_empty() {
        None
    } else {
        Some((label, confidence))
    }
}

/// Walk [`FALLBACK_ENCODINGS`] and return the first full, strict decode.
pub fn decode_with_fallbacks(bytes: &[u8]) -> Option<DecodedText> {
    FALLBACK_ENCODINGS.iter().find_map(|label| {
        decode_bytes(bytes, label).map(|text| DecodedText {
            text,
            encoding: (*label).to_string(),
        })
    })
}

/// Strictly decode `bytes` as the encoding called `label`.
///
/// Returns `None` for unknown labels and for any malformed input. A byte-order
/// mark belonging to the requested encoding is dropped.
pub fn decode_bytes(bytes: &[u8], label: &str) -> Option<String> {
    let label = label.trim().to_ascii_lowercase();
    match label.as_str() {
        "ascii" | "us-ascii" => {
            if bytes.is_ascii() {
                String::from_utf8(bytes.to_vec()).ok()
            } else {
                None
            }
        }
        "utf-8" | "utf8" | "utf-8-sig" => decode_strict(UTF_8, bytes),
        "utf-16" | "utf16" => match Encoding::for_bom(bytes) {
            Some((encoding, _)) if encoding == UTF_16BE => decode_strict(UTF_16BE, bytes),
            _ => decode_strict(UTF_16LE, bytes),
        },
        "utf-16-le" | "utf-16le" => decode_strict(UTF_16LE, bytes),
        "utf-16-be" | "utf-16be" => decode_strict(UTF_16BE, bytes),
        "gbk" | "gb2312" => decode_strict(GBK, bytes),
        "gb18030" => decode_strict(GB18030, bytes),
        "big5" => decode_strict(BIG5, bytes),
        other => Encoding::for_label(other.as_bytes())
            .and_then(|encoding| decode_strict(encoding, bytes)),
    }
}

fn decode_strict(encoding: &'static Encoding, bytes: &[u8]) -> Option<String> {
    let body = match Encoding::for_bom(bytes) {
        Some((bom_encoding, bom_len)) if bom_encoding == encoding => &bytes[bom_len..],
        _ => bytes,
    };
    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .map(|text| text.into_owned())
}

fn read_error(path: &Path, err: std::io::Error) -> DocumentError {
    if err.kind() == std::io::ErrorKind::NotFound {
        DocumentError::NotFound(path.to_path_buf())
    } else {
        DocumentError::io(path, err)
    }
}
