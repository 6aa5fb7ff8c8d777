//! Medium Access Control (MAC) layer: the three concurrent actors
//! (Acknowledger, Receiver, Sender) and the Link controller that wires
//! them together and exposes the host-facing surface.

pub mod ack;
pub mod link;
pub mod receiver;
pub mod sender;

pub use link::Link;

use std::sync::Mutex;

use crate::frame::Frame;

/// The delivery-queue record handed to the host's `recv()` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredFrame {
    pub dest_addr: u16,
    pub src_addr: u16,
    pub payload: Vec<u8>,
}

/// The shared ack-slot: Receiver writes, Sender clears and reads a
/// single pending ACK via a mutex-protected option.
#[derive(Debug, Default)]
pub struct AckSlot(Mutex<Option<Frame>>);

impl AckSlot {
    pub fn new() -> Self {
        Self(Mutex::new(None))
    }

    pub fn set(&self, frame: Frame) {
        *self.0.lock().unwrap() = Some(frame);
    }

    /// Matches an awaited (dest, seq) pair, consuming the slot on hit.
    /// Non-matching contents (a stale ACK from a prior attempt) are left
    /// in place rather than discarded, since a fresh match may still arrive.
    pub fn take_matching(&self, seq: u16) -> Option<Frame> {
        let mut guard = self.0.lock().unwrap();
        if guard.as_ref().map(|f| f.seq) == Some(seq) {
            guard.take()
        } else {
            None
        }
    }

    /// Resets the slot to empty before each transmission attempt.
    pub fn clear(&self) {
        *self.0.lock().unwrap() = None;
    }
}
