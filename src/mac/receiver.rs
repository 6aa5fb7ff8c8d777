//! The Receiver actor: blocks on `rf.receive()`, filters by address, and
//! dispatches by frame type on its own thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;

use log::{debug, trace, warn};

use crate::clock::Clock;
use crate::frame::{Frame, FrameType};
use crate::mac::{AckSlot, DeliveredFrame};
use crate::rf::Rf;

pub fn run(
    rf: Arc<dyn Rf>,
    local_mac: u16,
    clock: Arc<Clock>,
    ack_slot: Arc<AckSlot>,
    ack_tx: Sender<Frame>,
    delivery_tx: Sender<DeliveredFrame>,
    stop: Arc<AtomicBool>,
) {
    while !stop.load(Ordering::Relaxed) {
        // `rf.receive()` has no cancellation point of its own; an
        // in-flight call may outlast a stop request.
        let bytes = rf.receive();

        let frame = match Frame::decode(&bytes) {
            Ok(frame) => frame,
            Err(_) => {
                warn!("receiver: dropping undersized frame ({} bytes)", bytes.len());
                continue;
            }
        };

        if !frame.checksum_valid(&bytes) {
            warn!("receiver: dropping corrupt frame (seq {})", frame.seq);
            continue;
        }

        if frame.dest != local_mac && !frame.is_broadcast() {
            trace!("receiver: ignoring frame not addressed to us (dest {:#06x})", frame.dest);
            continue;
        }

        match frame.frame_type {
            FrameType::Ack => {
                debug!("receiver: ACK for seq {} from {:#06x}", frame.seq, frame.src);
                ack_slot.set(frame);
            }
            FrameType::Beacon => {
                debug!("receiver: beacon from {:#06x}", frame.src);
                clock.absorb_beacon(&frame);
            }
            FrameType::Data | FrameType::Cts | FrameType::Rts => {
                let unicast = !frame.is_broadcast();
                let delivered = DeliveredFrame {
                    dest_addr: frame.dest,
                    src_addr: frame.src,
                    payload: frame.payload.clone(),
                };

                if unicast {
                    let ack_bytes = Frame::encode(
                        FrameType::Ack,
                        false,
                        frame.seq,
                        frame.src,
                        frame.dest,
                        &[],
                    );
                    let ack = Frame::decode(&ack_bytes).expect("freshly-encoded ACK decodes");
                    // Enqueue the ACK only after the frame is queued for
                    // delivery, so the host will eventually observe it
                    // even if the ACK itself is lost.
                    if delivery_tx.send(delivered).is_err() {
                        break;
                    }
                    let _ = ack_tx.send(ack);
                } else if delivery_tx.send(delivered).is_err() {
                    break;
                }
            }
        }
    }
}
