//! Point frame wire format
//!
//! A frame is a flat byte stream of zero or more 24-byte records. Each record
//! holds three IEEE-754 binary64 values (x, y, z) in little-endian byte order,
//! independent of the host platform.

use livecloud_core::{Error, Point3d, PointSet, Result};
use serde::{Deserialize, Serialize};

/// Size of one encoded coordinate in bytes
pub const COORDINATE_SIZE: usize = 8;

/// Size of one encoded point record in bytes
pub const RECORD_SIZE: usize = 3 * COORDINATE_SIZE;

/// A byte range of a transport buffer holding one frame.
///
/// The buffer is only borrowed; decoding copies the values out, so the
/// transport may reuse its storage as soon as decoding returns.
#[derive(Debug, Clone, Copy)]
pub struct RawFrame<'a> {
    buffer: &'a [u8],
    offset: usize,
    length: usize,
}

impl<'a> RawFrame<'a> {
    /// Describe `length` bytes of `buffer` starting at `offset`.
    /// The range is checked when the frame is decoded, not here.
    pub fn new(buffer: &'a [u8], offset: usize, length: usize) -> Self {
        Self { buffer, offset, length }
    }

    /// A frame spanning the whole buffer
    pub fn whole(buffer: &'a [u8]) -> Self {
        Self::new(buffer, 0, buffer.len())
    }

    /// Declared length of the frame in bytes
    pub fn len(&self) -> usize {
        self.length
    }

    /// Check if the frame declares zero bytes
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Number of complete records in the frame
    pub fn record_count(&self) -> usize {
        self.length / RECORD_SIZE
    }

    /// Bytes after the last complete record
    pub fn trailing_bytes(&self) -> usize {
        self.length % RECORD_SIZE
    }

    /// The declared byte range, or `OutOfBounds` if it runs past the buffer
    pub fn bytes(&self) -> Result<&'a [u8]> {
        let out_of_bounds = || Error::OutOfBounds {
            offset: self.offset,
            length: self.length,
            capacity: self.buffer.len(),
        };

        let end = self.offset.checked_add(self.length).ok_or_else(out_of_bounds)?;
        self.buffer.get(self.offset..end).ok_or_else(out_of_bounds)
    }
}

/// What to do with bytes that do not form a complete record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailingBytes {
    /// Drop the partial record
    #[default]
    Ignore,
    /// Fail with [`Error::TruncatedFrame`]
    Reject,
}

/// Decoding options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    pub trailing: TrailingBytes,
}

impl DecodeOptions {
    /// Options that drop trailing partial records
    pub fn lenient() -> Self {
        Self { trailing: TrailingBytes::Ignore }
    }

    /// Options that reject trailing partial records
    pub fn strict() -> Self {
        Self { trailing: TrailingBytes::Reject }
    }
}

/// Decodes frames into point sets
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameDecoder {
    options: DecodeOptions,
}

impl FrameDecoder {
    /// Create a decoder with the given options
    pub fn new(options: DecodeOptions) -> Self {
        Self { options }
    }

    /// Options this decoder applies to every frame
    pub fn options(&self) -> DecodeOptions {
        self.options
    }

    /// Decode every complete record of `frame`, in transmission order
    pub fn decode(&self, frame: RawFrame<'_>) -> Result<PointSet> {
        let bytes = frame.bytes()?;

        let remainder = frame.trailing_bytes();
        if remainder != 0 {
            match self.options.trailing {
                TrailingBytes::Ignore => {
                    log::trace!(
                        "Ignoring {} trailing bytes of a {} byte frame",
                        remainder,
                        frame.len()
                    );
                }
                TrailingBytes::Reject => {
                    return Err(Error::TruncatedFrame {
                        length: frame.len(),
                        remainder,
                    });
                }
            }
        }

        let mut points = PointSet::with_capacity(frame.record_count());
        for record in bytes.chunks_exact(RECORD_SIZE) {
            points.push(read_record(record));
        }
        Ok(points)
    }
}

/// Decode a whole buffer, dropping any trailing partial record
pub fn decode_points(bytes: &[u8]) -> Result<PointSet> {
    FrameDecoder::default().decode(RawFrame::whole(bytes))
}

/// Encode points into the frame wire format
pub fn encode_points<'a, I>(points: I) -> Vec<u8>
where
    I: IntoIterator<Item = &'a Point3d>,
{
    let mut bytes = Vec::new();
    encode_points_into(points, &mut bytes);
    bytes
}

/// Append the encoding of `points` to `out`
pub fn encode_points_into<'a, I>(points: I, out: &mut Vec<u8>)
where
    I: IntoIterator<Item = &'a Point3d>,
{
    let points = points.into_iter();
    out.reserve(points.size_hint().0 * RECORD_SIZE);

    for point in points {
        out.extend_from_slice(&point.x.to_le_bytes());
        out.extend_from_slice(&point.y.to_le_bytes());
        out.extend_from_slice(&point.z.to_le_bytes());
    }
}

fn read_record(record: &[u8]) -> Point3d {
    Point3d::new(
        read_f64_le(&record[0..COORDINATE_SIZE]),
        read_f64_le(&record[COORDINATE_SIZE..2 * COORDINATE_SIZE]),
        read_f64_le(&record[2 * COORDINATE_SIZE..RECORD_SIZE]),
    )
}

fn read_f64_le(slice: &[u8]) -> f64 {
    let mut buf = [0u8; COORDINATE_SIZE];
    buf.copy_from_slice(slice);
    f64::from_le_bytes(buf)
}
