//! Raw motion event types shared by every collector.
//!
//! Events carry only relative motion and the origin tag the OS reports for
//! them. Absolute cursor positions are never read.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Origin tag attached to every motion event the engine injects.
///
/// The capture path compares incoming tags against this value to tell its
/// own output apart from physical device motion.
pub const SYNTHETIC_ORIGIN: u64 = 0xDEAD_BEEF;

/// Size of the scratch buffer raw input messages are decoded into.
pub const SCRATCH_CAPACITY: usize = 1024;

/// One relative motion report from a pointing device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMotionEvent {
    pub dx: i32,
    pub dy: i32,
    /// Extra-information tag from the OS; `SYNTHETIC_ORIGIN` for our own output.
    pub origin: u64,
}

impl RawMotionEvent {
    /// A physical motion event with no origin tag.
    pub fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy, origin: 0 }
    }

    /// A motion event tagged as engine output.
    pub fn synthetic(dx: i32, dy: i32) -> Self {
        Self {
            dx,
            dy,
            origin: SYNTHETIC_ORIGIN,
        }
    }

    /// Whether this event is an echo of the engine's own injection.
    pub fn is_synthetic(&self) -> bool {
        self.origin == SYNTHETIC_ORIGIN
    }
}

/// A raw input message that could not be decoded into a motion event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputDecodeError {
    #[error("input message of {size} bytes does not fit the {capacity}-byte buffer")]
    Oversized { size: usize, capacity: usize },
    #[error("input message was shorter than its reported size")]
    ShortRead,
    #[error("input message is not from a mouse")]
    NotMouse,
}

/// Fixed-size buffer raw input messages are copied into before decoding.
///
/// Owned by the capture thread; released when the thread's state is dropped.
#[derive(Debug)]
pub struct ScratchBuffer {
    bytes: Box<[u8]>,
}

impl ScratchBuffer {
    pub fn new() -> Self {
        Self::with_capacity(SCRATCH_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: vec![0u8; capacity].into_boxed_slice(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Reject a message before any bytes are copied if it would not fit.
    pub fn check_capacity(&self, size: usize) -> Result<(), InputDecodeError> {
        if size > self.capacity() {
            Err(InputDecodeError::Oversized {
                size,
                capacity: self.capacity(),
            })
        } else {
            Ok(())
        }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl Default for ScratchBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Size of the raw input header: type, size, device handle and wparam.
pub const RAW_HEADER_SIZE: usize = 8 + 2 * std::mem::size_of::<usize>();

/// Size of the mouse payload that follows the header.
pub const RAW_MOUSE_SIZE: usize = 24;

const RIM_TYPEMOUSE: u32 = 0;
const MOUSE_MOVE_ABSOLUTE: u16 = 0x01;

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Decode a raw input message already copied into `bytes`.
///
/// Only relative mouse motion is accepted; absolute-position reports
/// (tablets, remote sessions) decode to a zero move.
pub fn decode_raw_mouse(bytes: &[u8]) -> Result<RawMotionEvent, InputDecodeError> {
    if bytes.len() < RAW_HEADER_SIZE + RAW_MOUSE_SIZE {
        return Err(InputDecodeError::ShortRead);
    }
    if read_u32(bytes, 0) != RIM_TYPEMOUSE {
        return Err(InputDecodeError::NotMouse);
    }
    let body = &bytes[RAW_HEADER_SIZE..];
    let flags = u16::from_le_bytes([body[0], body[1]]);
    let origin = u64::from(read_u32(body, 20));
    if flags & MOUSE_MOVE_ABSOLUTE != 0 {
        return Ok(RawMotionEvent { dx: 0, dy: 0, origin });
    }
    Ok(RawMotionEvent {
        dx: read_u32(body, 12) as i32,
        dy: read_u32(body, 16) as i32,
        origin,
    })
}
