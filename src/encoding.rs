//! Text decoding with ordered encoding fallbacks.
//!
//! Templates and converter output come from many editors. Each input is tried
//! as UTF-8 first, then against every fallback label in order. The last resort
//! is lossy UTF-8, so reading text never fails on content alone.

use encoding_rs::{Encoding, UTF_8};
use std::path::Path;

use crate::error::{Error, Result};

/// Fallback encodings tried after UTF-8, in order.
pub const DEFAULT_FALLBACK_ENCODINGS: &[&str] = &["windows-1252", "iso-8859-2"];

/// Decoded text together with the encoding that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    /// Decoded content
    pub text: String,
    /// Name of the encoding that decoded the bytes
    pub encoding: &'static str,
    /// Whether undecodable bytes were replaced
    pub lossy: bool,
}

/// Decode bytes with UTF-8 and the default fallbacks.
pub fn decode(bytes: &[u8]) -> DecodedText {
    decode_with_fallbacks(bytes, DEFAULT_FALLBACK_ENCODINGS)
}

/// Decode bytes with UTF-8 and the given fallback labels.
///
/// Unknown labels are skipped with a warning.
pub fn decode_with_fallbacks<S: AsRef<str>>(bytes: &[u8], fallbacks: &[S]) -> DecodedText {
    let (bytes, bom_encoding) = match Encoding::for_bom(bytes) {
        Some((encoding, bom_len)) => (&bytes[bom_len..], Some(encoding)),
        None => (bytes, None),
    };

    let candidates = bom_encoding.into_iter().chain(std::iter::once(UTF_8)).chain(
        fallbacks.iter().filter_map(|label| {
            let found = Encoding::for_label(label.as_ref().as_bytes());
            if found.is_none() {
                log::warn!("Unknown encoding label '{}', skipping", label.as_ref());
            }
            found
        }),
    );

    for encoding in candidates {
        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(bytes) {
            log::debug!("Decoded {} bytes as {}", bytes.len(), encoding.name());
            return DecodedText {
                text: text.into_owned(),
                encoding: encoding.name(),
                lossy: false,
            };
        }
    }

    log::warn!("No configured encoding fits; decoding as UTF-8 with replacement");
    DecodedText {
        text: String::from_utf8_lossy(bytes).into_owned(),
        encoding: UTF_8.name(),
        lossy: true,
    }
}

/// Read a file and decode it with UTF-8 and the given fallbacks.
pub fn read_text<P: AsRef<Path>, S: AsRef<str>>(path: P, fallbacks: &[S]) -> Result<DecodedText> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let decoded = decode_with_fallbacks(&bytes, fallbacks);
    if decoded.encoding != UTF_8.name() {
        log::info!("Read {} as {}", path.display(), decoded.encoding);
    }
    Ok(decoded)
}

/// Check that a label names an encoding known to the decoder.
pub fn validate_label(label: &str) -> Result<&'static str> {
    Encoding::for_label(label.as_bytes())
        .map(|e| e.name())
        .ok_or_else(|| Error::Encoding(format!("unknown encoding label: {}", label)))
}
