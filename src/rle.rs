//! TGA run-length packets over fixed-size pixel records.
//!
//! A packet is one control byte followed by pixel records: control >= 128
//! means "repeat the next record `control - 127` times", control < 128
//! means "`control + 1` literal records follow". A packet never holds more
//! than 128 pixels and never splits a record.

use alloc::vec::Vec;

use crate::error::TgaError;
use crate::reader::ByteReader;

/// Largest record the format can produce (32-bit pixels).
const MAX_RECORD: usize = 4;

/// RLE-encode one row of `record_len`-byte pixel records.
///
/// Scans for runs of identical records, flushing a repeat packet when a
/// differing pixel breaks the run and a direct packet when two identical
/// records end it, either one also at the 128-pixel cap. The trailing run
/// is always flushed, so even a single-pixel row emits one packet.
pub(crate) fn encode_row(out: &mut Vec<u8>, row: &[u8], record_len: usize) {
    let width = row.len() / record_len;
    let rec = |i: usize| &row[i * record_len..(i + 1) * record_len];

    let mut repeat = 0usize;
    let mut direct = 0usize;
    let mut from = 0usize;

    for x in 1..width {
        if rec(x - 1) != rec(x) {
            // next pixel is different
            if repeat > 0 {
                out.push((128 + repeat) as u8);
                out.extend_from_slice(rec(from));
                from = x;
                repeat = 0;
                direct = 0;
            } else {
                direct += 1;
            }
        } else {
            // next pixel is the same
            if direct > 0 {
                out.push((direct - 1) as u8);
                out.extend_from_slice(&row[from * record_len..(from + direct) * record_len]);
                from = x - 1;
                direct = 0;
                repeat = 1;
            } else {
                repeat += 1;
            }
        }

        if repeat == 128 {
            out.push(255);
            out.extend_from_slice(rec(from));
            from = x;
            direct = 0;
            repeat = 0;
        } else if direct == 128 {
            out.push(127);
            out.extend_from_slice(&row[from * record_len..(from + direct) * record_len]);
            from = x;
            direct = 0;
            repeat = 0;
        }
    }

    if repeat > 0 {
        out.push((128 + repeat) as u8);
        out.extend_from_slice(rec(from));
    } else {
        out.push(direct as u8);
        out.extend_from_slice(&row[from * record_len..(from + direct + 1) * record_len]);
    }
}

/// Packet decoder for one decode session.
///
/// Packets do not align to row boundaries, so the open-run counters and
/// the current repeat sample carry across `read_row` calls. State is owned
/// here rather than shared anywhere, which keeps independent decode
/// sessions independent.
#[derive(Debug, Default)]
pub(crate) struct RleReader {
    repeat: usize,
    direct: usize,
    sample: [u8; MAX_RECORD],
}

impl RleReader {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Fill `row` with decoded records, pulling packets as needed.
    pub(crate) fn read_row(
        &mut self,
        src: &mut ByteReader<'_>,
        row: &mut [u8],
        record_len: usize,
    ) -> Result<(), TgaError> {
        for out in row.chunks_exact_mut(record_len) {
            if self.repeat == 0 && self.direct == 0 {
                let control = src.read_u8().ok_or(TgaError::UnexpectedEndOfStream)?;
                if control >= 128 {
                    self.repeat = usize::from(control) - 127;
                    let sample = src
                        .read_slice(record_len)
                        .ok_or(TgaError::UnexpectedEndOfStream)?;
                    self.sample[..record_len].copy_from_slice(sample);
                } else {
                    self.direct = usize::from(control) + 1;
                }
            }

            if self.repeat > 0 {
                out.copy_from_slice(&self.sample[..record_len]);
                self.repeat -= 1;
            } else {
                let literal = src
                    .read_slice(record_len)
                    .ok_or(TgaError::UnexpectedEndOfStream)?;
                out.copy_from_slice(literal);
                self.direct -= 1;
            }
        }
        Ok(())
    }
}
