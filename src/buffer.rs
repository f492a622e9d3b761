//! Delimits concatenated PNG containers in a raw converter output stream.

use crate::error::{PDF2PngError, Result};

/// Every PNG ends with an IEND chunk: the four byte tag followed by a four
/// byte CRC. `pdftoppm` writes one complete PNG per page back to back with
/// no length framing, so the trailer is the only delimiter available.
const PNG_TRAILER_TAG: &[u8] = b"IEND";
const PNG_TRAILER_LEN: usize = PNG_TRAILER_TAG.len() + 4;

/// Splits a stream of back-to-back PNGs into one slice per image, in
/// stream order. Bytes after the final trailer that do not form a complete
/// image are an error.
pub(crate) fn split_png_stream(data: &[u8]) -> Result<Vec<&[u8]>> {
    let mut images = Vec::new();
    let mut rest = data;
    while !rest.is_empty() {
        let tag = find(rest, PNG_TRAILER_TAG).ok_or(PDF2PngError::TruncatedImageStream)?;
        let end = tag + PNG_TRAILER_LEN;
        if end > rest.len() {
            return Err(PDF2PngError::TruncatedImageStream);
        }
        let (image, tail) = rest.split_at(end);
        images.push(image);
        rest = tail;
    }
    Ok(images)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
