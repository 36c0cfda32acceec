//! Incremental UTF-8 decoding
//!
//! Transports hand back arbitrary byte slices. A multi-byte character may be
//! split across two reads, so undecodable trailing bytes are held until the
//! next read completes them. Invalid sequences become U+FFFD.

/// Streaming UTF-8 decoder
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    /// Incomplete trailing sequence from the previous call (at most 3 bytes)
    pending: Vec<u8>,
}

impl Utf8ChunkDecoder {
    /// Create a decoder with no pending bytes
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `bytes`, holding back an incomplete trailing sequence
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        let mut input = std::mem::take(&mut self.pending);
        input.extend_from_slice(bytes);

        let mut out = String::with_capacity(input.len());
        let mut rest = input.as_slice();

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    // valid_up_to guarantees this prefix decodes
                    out.push_str(std::str::from_utf8(valid).unwrap_or_default());

                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            self.pending.extend_from_slice(after);
                            break;
                        }
                    }
                }
            }
        }

        out
    }

    /// Flush held-back bytes at end of stream
    ///
    /// An incomplete sequence can no longer be completed, so it decodes
    /// lossily.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        let pending = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&pending).into_owned()
    }

    /// Number of bytes waiting for completion
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
