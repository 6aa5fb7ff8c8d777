//! The Sender actor: CSMA/CA with DIFS + binary exponential backoff, ACK
//! awaiting, retransmission, and beacon interleaving. The heart of the
//! core.

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration;

use log::{debug, error, warn};
use rand::Rng;

use crate::clock::Clock;
use crate::config::{LinkConfig, SlotSelection};
use crate::error::StatusCode;
use crate::frame::{Frame, FrameType};
use crate::mac::AckSlot;
use crate::rf::Rf;

/// Carrier-sense polling period while waiting for the medium to clear.
const POLL_PERIOD_MS: u64 = 50;

/// ACK slot polling period while awaiting a reply.
const ACK_WAIT_TIME_MS: u64 = 50;

/// Base ACK timeout; actual timeout is `TIMEOUT_DURATION = 7500 + aSlotTime`.
const ACK_TIMEOUT_BASE_MS: u64 = 7500;

pub fn run(
    rf: Arc<dyn Rf>,
    outbound: Receiver<Frame>,
    clock: Arc<Clock>,
    ack_slot: Arc<AckSlot>,
    config: Arc<LinkConfig>,
    status: Arc<AtomicI32>,
    stop: Arc<AtomicBool>,
) {
    while !stop.load(Ordering::Relaxed) {
        let frame = match next_work_item(&clock, &outbound, &stop) {
            Some(frame) => frame,
            None => continue,
        };

        let is_beacon = frame.frame_type == FrameType::Beacon;
        let delivered = transmit_with_retries(&rf, &clock, &ack_slot, &config, frame);

        // Beacons are MAC-internal, not host-submitted; they never
        // overwrite the `status()` the host is polling after its own send.
        if !is_beacon {
            status.store(
                if delivered {
                    StatusCode::TxDelivered
                } else {
                    StatusCode::TxFailed
                }
                .as_i32(),
                Ordering::SeqCst,
            );
        }
    }
}

/// Beacons take priority when ready; otherwise polls the outbound queue
/// with a 50ms timeout so the loop can re-check beacon readiness and the
/// stop flag.
fn next_work_item(
    clock: &Arc<Clock>,
    outbound: &Receiver<Frame>,
    stop: &Arc<AtomicBool>,
) -> Option<Frame> {
    if let Some(beacon) = clock.build_beacon() {
        return Some(beacon);
    }

    match outbound.recv_timeout(Duration::from_millis(POLL_PERIOD_MS)) {
        Ok(frame) => Some(frame),
        Err(std::sync::mpsc::RecvTimeoutError::Timeout) => None,
        Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
            stop.store(true, Ordering::Relaxed);
            None
        }
    }
}

fn requires_ack(frame: &Frame) -> bool {
    !frame.is_broadcast() && frame.frame_type != FrameType::Beacon
}

/// The transmission-attempt loop: DIFS wait, backoff, transmit, await
/// ACK, retry with doubled `cw` on failure.
fn transmit_with_retries(
    rf: &Arc<dyn Rf>,
    clock: &Arc<Clock>,
    ack_slot: &Arc<AckSlot>,
    config: &Arc<LinkConfig>,
    mut frame: Frame,
) -> bool {
    let mut cw = rf.a_cw_min() + 1;
    let mut retry = 0u32;
    let ack_needed = requires_ack(&frame);

    loop {
        let busy_observed = difs_wait(rf);
        if busy_observed {
            backoff(rf, config, cw);
        }

        ack_slot.clear();
        rf.transmit(&frame.to_bytes());
        debug!(
            "sender: transmitted seq {} to {:#06x} (retry {})",
            frame.seq, frame.dest, retry
        );

        let transmitted = if ack_needed {
            await_ack(rf, clock, ack_slot, frame.seq)
        } else {
            true
        };

        if transmitted {
            return true;
        }

        retry += 1;
        if retry >= rf.dot11_retry_limit() {
            error!("sender: retry limit exhausted for seq {}", frame.seq);
            return false;
        }

        warn!("sender: ACK timeout for seq {}, retrying", frame.seq);
        cw = (cw * 2).min(rf.a_cw_max() + 1);
        frame.retransmission = true;
    }
}

/// DIFS = aSIFSTime + 2*aSlotTime. Busy-waits in `POLL_PERIOD_MS` steps
/// until the medium is clear, then idles the rounded-up DIFS period,
/// re-checking once more before declaring the channel clear.
fn difs_wait(rf: &Arc<dyn Rf>) -> bool {
    let mut busy_observed = false;

    loop {
        while rf.in_use() {
            busy_observed = true;
            sleep(Duration::from_millis(POLL_PERIOD_MS));
        }

        let difs = rf.a_sifs_time() as u64 + 2 * rf.a_slot_time() as u64;
        let now = rf.clock();
        let rounding = POLL_PERIOD_MS - (now % POLL_PERIOD_MS);
        sleep(Duration::from_millis(difs + rounding));

        if !rf.in_use() {
            return busy_observed;
        }
        busy_observed = true;
    }
}

/// Picks a slot count on `[0, cw)` (random, or `cw - 1` deterministic for
/// reproducible tests), sleeping one `aSlotTime` per slot and restarting
/// the DIFS wait if the medium goes busy mid-slot.
fn backoff(rf: &Arc<dyn Rf>, config: &Arc<LinkConfig>, cw: u32) {
    let slots = match config.slot_selection() {
        SlotSelection::Random => {
            if cw <= 1 {
                0
            } else {
                rand::thread_rng().gen_range(0..cw)
            }
        }
        SlotSelection::DeterministicMax => cw.saturating_sub(1),
    };

    let mut remaining = slots;
    while remaining > 0 {
        sleep(Duration::from_millis(rf.a_slot_time() as u64));
        if rf.in_use() {
            difs_wait(rf);
        }
        remaining -= 1;
    }
}

/// Polls the ack-slot every `ACK_WAIT_TIME_MS` until a matching ACK
/// arrives or `TIMEOUT_DURATION = 7500 + aSlotTime` elapses.
fn await_ack(rf: &Arc<dyn Rf>, clock: &Arc<Clock>, ack_slot: &Arc<AckSlot>, seq: u16) -> bool {
    let timeout_at = clock.now() + ACK_TIMEOUT_BASE_MS + rf.a_slot_time() as u64;

    loop {
        if ack_slot.take_matching(seq).is_some() {
            return true;
        }
        if clock.now() >= timeout_at {
            return false;
        }
        sleep(Duration::from_millis(ACK_WAIT_TIME_MS));
    }
}
