//! # zentarga
//!
//! TrueVision TGA (Targa) image format decoder and encoder.
//!
//! ## Supported files
//!
//! - Colormapped (8-bit indices; 15/16/24/32-bit palette entries),
//!   truecolor (15/16/24/32-bit), and grayscale (8-bit, 16-bit with alpha)
//!   images, raw or run-length encoded, in either row origin, including
//!   the broken-header variants common in the wild.
//! - Colormapped files whose palette carries alpha, spans more than 256
//!   entries, or is deeper than 24 bits decode promoted to direct color.
//! - Version-2 footers are recognized and their extension areas skipped;
//!   extension content (comments, dates, gamma) is never interpreted.
//!
//! ## Zero-Copy Decoding
//!
//! For uncompressed, unflipped grayscale and indexed files the pixel
//! bytes in the file are already canonical, so decoding returns a
//! borrowed slice with no allocation. Everything else (RLE, BGR reorder,
//! 15/16-bit upsampling, colormap application, row flips) allocates as
//! needed.
//!
//! ## Streaming
//!
//! [`DecodeRequest::decode_into`] and [`EncodeRequest::encode_rows`] move
//! pixels through caller-provided [`RowSink`]/[`RowSource`] capabilities a
//! stripe at a time, so peak memory is one stripe plus the colormap no
//! matter the image size. Cancellation via [`Stop`] is checked at stripe
//! boundaries.
//!
//! ## Non-Goals
//!
//! - Version-2 extension and developer areas (only skipped, never written)
//! - Multi-layer sources (flatten first)
//!
//! ## Usage
//!
//! ```no_run
//! use zentarga::{DecodeRequest, EncodeRequest, ImageDescription, TgaInfo};
//! use enough::Unstoppable;
//!
//! let data: &[u8] = &[]; // your TGA bytes
//!
//! // Probe without decoding
//! let info = TgaInfo::from_bytes(data).unwrap();
//! println!("{}x{} {:?}", info.width, info.height, info.layout);
//!
//! // Decode
//! let decoded = DecodeRequest::new(data).decode(Unstoppable)?;
//!
//! // Re-encode, run-length compressed, bottom-left origin
//! let desc = ImageDescription::new(decoded.width, decoded.height, decoded.layout);
//! let encoded = EncodeRequest::new().encode(&desc, decoded.pixels(), Unstoppable)?;
//! # Ok::<(), zentarga::TgaError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

mod convert;
mod decode;
mod encode;
mod error;
mod format;
mod header;
mod info;
mod limits;
mod pixel;
mod reader;
mod rle;

// Re-exports
pub use decode::{DecodeOutput, DecodeRequest, RowSink};
pub use encode::{EncodeRequest, ImageDescription, RowSource};
pub use enough::{Stop, Unstoppable};
pub use error::TgaError;
pub use info::{EXTENSIONS, TgaInfo, matches_signature};
pub use limits::Limits;
pub use pixel::PixelLayout;

#[cfg(feature = "rgb")]
pub use pixel::DecodePixel;
