//! Polyline representation and the encoded-polyline codec.
//!
//! Paths travel as decoded coordinate sequences inside the planner.
//! Encoding/decoding happens at the boundary (when receiving from a routing
//! provider or sending to a map renderer).
//!
//! Wire format: each coordinate is stored as a delta from the previous one,
//! scaled by `10^precision`, zig-zag folded to an unsigned value and split
//! into 5-bit groups, least significant first. Every group except the last
//! carries the `0x20` continuation bit and each group is offset by 63 into
//! printable ASCII.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::Location;

/// Precision used by Google and by OSRM's `polyline` geometry.
pub const DEFAULT_PRECISION: u32 = 5;

const CHUNK_OFFSET: u8 = 63;
const CONTINUATION_BIT: i64 = 0x20;
const CHUNK_MASK: i64 = 0x1f;

/// Largest scaled coordinate the encoder accepts; keeps every delta and its
/// zig-zag fold inside `i64`.
const MAX_SCALED: f64 = (1u64 << 61) as f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolylineError {
    /// Byte below the printable offset.
    InvalidCharacter { offset: usize, byte: u8 },
    /// Input ended inside a value or between latitude and longitude.
    Truncated { offset: usize },
    /// A value kept its continuation bit past 64 bits, or the running
    /// coordinate left the `i64` range.
    Overflow { offset: usize },
    /// A point cannot be scaled to an integer at the requested precision.
    OutOfRange { index: usize },
}

impl fmt::Display for PolylineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolylineError::InvalidCharacter { offset, byte } => {
                write!(f, "invalid polyline byte 0x{:02x} at offset {}", byte, offset)
            }
            PolylineError::Truncated { offset } => {
                write!(f, "polyline truncated at offset {}", offset)
            }
            PolylineError::Overflow { offset } => {
                write!(f, "polyline value overflows at offset {}", offset)
            }
            PolylineError::OutOfRange { index } => {
                write!(f, "point {} cannot be encoded", index)
            }
        }
    }
}

impl std::error::Error for PolylineError {}

/// A polyline representing a route geometry as decoded coordinates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Location>,
}

impl Polyline {
    /// Wraps already decoded points.
    pub fn new(points: Vec<Location>) -> Self {
        Self { points }
    }

    /// Decodes a precision-5 encoded polyline.
    pub fn decode(encoded: &str) -> Result<Self, PolylineError> {
        Self::decode_with_precision(encoded, DEFAULT_PRECISION)
    }

    pub fn decode_with_precision(encoded: &str, precision: u32) -> Result<Self, PolylineError> {
        let factor = 10f64.powi(precision as i32);
        let bytes = encoded.as_bytes();
        let mut points = Vec::new();
        let mut offset = 0;
        let mut lat: i64 = 0;
        let mut lng: i64 = 0;

        while offset < bytes.len() {
            lat = accumulate(lat, bytes, &mut offset)?;
            lng = accumulate(lng, bytes, &mut offset)?;
            points.push(Location::new(lat as f64 / factor, lng as f64 / factor));
        }

        Ok(Self { points })
    }

    /// Encodes at precision 5.
    pub fn encode(&self) -> Result<String, PolylineError> {
        self.encode_with_precision(DEFAULT_PRECISION)
    }

    /// Fails with [`PolylineError::OutOfRange`] for non-finite points or
    /// coordinates too large for the precision.
    pub fn encode_with_precision(&self, precision: u32) -> Result<String, PolylineError> {
        let factor = 10f64.powi(precision as i32);
        let mut out = String::new();
        let mut prev_lat: i64 = 0;
        let mut prev_lng: i64 = 0;

        for (index, point) in self.points.iter().enumerate() {
            let out_of_range = PolylineError::OutOfRange { index };
            let lat = scale(point.latitude, factor).ok_or(out_of_range)?;
            let lng = scale(point.longitude, factor).ok_or(out_of_range)?;
            let delta_lat = lat.checked_sub(prev_lat).ok_or(out_of_range)?;
            let delta_lng = lng.checked_sub(prev_lng).ok_or(out_of_range)?;
            push_value(&mut out, delta_lat);
            push_value(&mut out, delta_lng);
            prev_lat = lat;
            prev_lng = lng;
        }

        Ok(out)
    }

    /// Decoded points in path order.
    pub fn points(&self) -> &[Location] {
        &self.points
    }

    pub fn into_points(self) -> Vec<Location> {
        self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl From<Vec<Location>> for Polyline {
    fn from(points: Vec<Location>) -> Self {
        Self::new(points)
    }
}

/// Adds the next delta to a running coordinate.
fn accumulate(total: i64, bytes: &[u8], offset: &mut usize) -> Result<i64, PolylineError> {
    let start = *offset;
    let delta = next_value(bytes, offset)?;
    total
        .checked_add(delta)
        .ok_or(PolylineError::Overflow { offset: start })
}

/// Rounds a coordinate to its integer wire value.
fn scale(coordinate: f64, factor: f64) -> Option<i64> {
    let scaled = (coordinate * factor).round();
    (scaled.is_finite() && scaled.abs() <= MAX_SCALED).then_some(scaled as i64)
}

/// Reads one zig-zag encoded delta starting at `offset`.
fn next_value(bytes: &[u8], offset: &mut usize) -> Result<i64, PolylineError> {
    let mut result: i64 = 0;
    let mut shift = 0u32;

    loop {
        let Some(&byte) = bytes.get(*offset) else {
            return Err(PolylineError::Truncated { offset: *offset });
        };
        if byte < CHUNK_OFFSET {
            return Err(PolylineError::InvalidCharacter {
                offset: *offset,
                byte,
            });
        }
        if shift >= 64 {
            return Err(PolylineError::Overflow { offset: *offset });
        }

        let chunk = (byte - CHUNK_OFFSET) as i64;
        result |= (chunk & CHUNK_MASK) << shift;
        shift += 5;
        *offset += 1;

        if chunk & CONTINUATION_BIT == 0 {
            break;
        }
    }

    Ok(if result & 1 != 0 {
        !(result >> 1)
    } else {
        result >> 1
    })
}

fn push_value(out: &mut String, value: i64) {
    let mut folded = if value < 0 { !(value << 1) } else { value << 1 };
    while folded >= CONTINUATION_BIT {
        let chunk = (CONTINUATION_BIT | (folded & CHUNK_MASK)) as u8 + CHUNK_OFFSET;
        out.push(chunk as char);
        folded >>= 5;
    }
    out.push((folded as u8 + CHUNK_OFFSET) as char);
}
