//! Offset-corrected network time and beacon scheduling.
//!
//! A single additive, monotone clock correction with no drift model:
//! beacons only ever pull the local clock forward, never back.

use std::sync::atomic::{AtomicI64, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use byteorder::{BigEndian, ByteOrder};

use crate::frame::{Frame, FrameType, BROADCAST_ADDR};
use crate::rf::Rf;

/// Beacons are pre-stamped this many milliseconds ahead of `now()` to
/// account for the DIFS/backoff wait the frame still has to clear
/// before it actually reaches the air.
pub const TRANSMISSION_DELAY_MS: u64 = 10;

/// Offset-corrected clock shared between the Receiver (writer, via
/// `absorb_beacon`) and the Sender (reader, via `now`/`beacon_ready`/
/// `build_beacon`).
#[derive(Debug)]
pub struct Clock {
    rf: Arc<dyn Rf>,
    local_mac: u16,
    /// Added to `rf.clock()` to produce network time. Monotone
    /// non-decreasing.
    offset: AtomicI64,
    /// Beacon interval in ms; negative disables beaconing (`command 3`).
    interval_ms: AtomicI64,
    last_beacon_time: AtomicU64,
    beacon_seq: AtomicU32,
}

impl Clock {
    pub fn new(rf: Arc<dyn Rf>, local_mac: u16) -> Self {
        Self {
            rf,
            local_mac,
            offset: AtomicI64::new(0),
            interval_ms: AtomicI64::new(-1),
            last_beacon_time: AtomicU64::new(0),
            beacon_seq: AtomicU32::new(0),
        }
    }

    /// `rf.clock() + offset`.
    pub fn now(&self) -> u64 {
        let rf_now = self.rf.clock() as i64;
        (rf_now + self.offset.load(Ordering::SeqCst)) as u64
    }

    /// Parses the beacon payload as a big-endian 64-bit timestamp. If it
    /// exceeds `now()`, pulls the offset forward; never decreases it.
    pub fn absorb_beacon(&self, frame: &Frame) {
        if frame.payload.len() < 8 {
            return;
        }
        let t = BigEndian::read_u64(&frame.payload[0..8]);
        let now = self.now();
        if t > now {
            let delta = (t - now) as i64;
            self.offset.fetch_add(delta, Ordering::SeqCst);
        }
    }

    /// Negative values disable beaconing (`command 3`, val = -1).
    pub fn set_interval_ms(&self, interval_ms: i64) {
        self.interval_ms.store(interval_ms, Ordering::SeqCst);
    }

    pub fn interval_ms(&self) -> i64 {
        self.interval_ms.load(Ordering::SeqCst)
    }

    pub fn beacon_ready(&self) -> bool {
        let interval = self.interval_ms.load(Ordering::SeqCst);
        if interval < 0 {
            return false;
        }
        let now = self.now();
        now >= self.last_beacon_time.load(Ordering::SeqCst) + interval as u64
    }

    /// Builds a BEACON frame when ready, aligning `last_beacon_time` to
    /// the interval boundary and incrementing the per-clock beacon
    /// sequence counter. Returns `None` if not ready.
    pub fn build_beacon(&self) -> Option<Frame> {
        if !self.beacon_ready() {
            return None;
        }

        let interval = self.interval_ms.load(Ordering::SeqCst).max(1) as u64;
        let now = self.now();
        let stamped = now + TRANSMISSION_DELAY_MS;

        let mut payload = [0u8; 8];
        BigEndian::write_u64(&mut payload, stamped);

        let seq = self.beacon_seq.fetch_add(1, Ordering::SeqCst) as u16 & 0x0FFF;

        self.last_beacon_time
            .store(now - (now % interval), Ordering::SeqCst);

        let bytes = Frame::encode(
            FrameType::Beacon,
            false,
            seq,
            BROADCAST_ADDR,
            self.local_mac,
            &payload,
        );
        Frame::decode(&bytes).ok()
    }
}
