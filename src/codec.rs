//! DEFLATE codec adapter (spec §4.2, §9 "Codec abstraction")
//!
//! Exposes `encode_stream`/`decode_stream` plus single-shot
//! `deflate_buffer`/`inflate_buffer` helpers over *raw* DEFLATE (no zlib or
//! gzip framing), via `flate2::{read,write}::Deflate{Encoder,Decoder}`
//! (as opposed to the `Zlib*`/`Gz*` variants, deliberately avoided in
//! `writer.rs`/`reader.rs`). Isolated behind this module so a future
//! method (bzip2, say) could slot in without the writer/reader needing to
//! know which crate backs it.

use crate::error::Result;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::{Read, Write};

/// Compression method id as it appears on the wire (LFH/CDH `method` field).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Store = 0,
    Deflate = 8,
}

impl Method {
    pub fn from_u16(v: u16) -> Option<Self> {
        match v {
            0 => Some(Method::Store),
            8 => Some(Method::Deflate),
            _ => None,
        }
    }

    pub fn to_u16(self) -> u16 {
        self as u16
    }
}

fn level_for(level: i32) -> Compression {
    if (0..=9).contains(&level) {
        Compression::new(level as u32)
    } else {
        Compression::default()
    }
}

/// Streams `reader`'s bytes into `writer`, DEFLATE-compressing them, raw
/// (no zlib/gzip header). `level` outside 0..=9 falls back to the codec
/// default, matching spec §4.2.
pub fn encode_stream<R: Read, W: Write>(mut reader: R, writer: W, level: i32) -> Result<W> {
    let mut encoder = DeflateEncoder::new(writer, level_for(level));
    std::io::copy(&mut reader, &mut encoder)?;
    Ok(encoder.finish()?)
}

/// Streams raw-DEFLATE compressed bytes from `reader` into `writer`,
/// inflating them.
pub fn decode_stream<R: Read, W: Write>(reader: R, mut writer: W) -> Result<u64> {
    let mut decoder = DeflateDecoder::new(reader);
    Ok(std::io::copy(&mut decoder, &mut writer)?)
}

/// Single-shot compress. Preallocates using DEFLATE's documented worst-case
/// expansion bound (store-block overhead: ~5 bytes per 32 KiB block + a
/// small constant) so the common case needs no reallocation.
pub fn deflate_buffer(input: &[u8], level: i32) -> Result<Vec<u8>> {
    let upper_bound = input.len() + (input.len() / 32_768 + 1) * 5 + 64;
    let out = Vec::with_capacity(upper_bound);
    let mut encoder = DeflateEncoder::new(out, level_for(level));
    encoder.write_all(input)?;
    Ok(encoder.finish()?)
}

/// Single-shot decompress. Starts at a heuristic buffer size and retries up
/// to 3 times doubling on short output, per spec §4.2.
pub fn inflate_buffer(input: &[u8]) -> Result<Vec<u8>> {
    let mut capacity = 1024usize.max(4 * input.len() + 64);
    let mut attempts = 0;
    loop {
        let mut out = vec![0u8; capacity];
        let mut decoder = DeflateDecoder::new(input);
        let mut written = 0usize;
        loop {
            match decoder.read(&mut out[written..]) {
                Ok(0) => break,
                Ok(n) => {
                    written += n;
                    if written == out.len() {
                        break;
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
        // If we filled the buffer exactly, there may be more output pending;
        // retry with a larger buffer rather than assume completion.
        if written < out.len() || attempts >= 3 {
            out.truncate(written);
            return Ok(out);
        }
        attempts += 1;
        capacity *= 2;
    }
}
