//! The Link controller: per-peer sequence bookkeeping, queue admission,
//! and the host-facing `send`/`recv`/`status`/`command` surface. Spawns
//! and owns the three actor threads.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::mpsc::{self, Receiver as MpscReceiver, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use log::info;

use crate::clock::Clock;
use crate::config::{DebugLevel, LinkConfig, SlotSelection};
use crate::error::{LinkError, StatusCode};
use crate::frame::{Frame, FrameType};
use crate::mac::{ack, receiver, sender, AckSlot, DeliveredFrame};
use crate::rf::Rf;

/// Outbound admission cap.
const OUTBOUND_QUEUE_CAP: usize = 4;

/// The host-facing link service.
pub struct Link {
    local_mac: u16,
    seq_map: Mutex<HashMap<u16, u16>>,
    outbound_tx: SyncSender<Frame>,
    delivery_rx: Mutex<MpscReceiver<DeliveredFrame>>,
    status: Arc<AtomicI32>,
    clock: Arc<Clock>,
    config: Arc<LinkConfig>,
    stop: Arc<AtomicBool>,
    sender_handle: Option<JoinHandle<()>>,
    receiver_handle: Option<JoinHandle<()>>,
    ack_handle: Option<JoinHandle<()>>,
}

impl Link {
    /// Spawns the Sender, Receiver and Acknowledger actors over `rf`.
    pub fn new<R: Rf + 'static>(rf: R, local_mac: u16) -> Result<Link, LinkError> {
        let rf: Arc<dyn Rf> = Arc::new(rf);

        let clock = Arc::new(Clock::new(rf.clone(), local_mac));
        let ack_slot = Arc::new(AckSlot::new());
        let config = Arc::new(LinkConfig::default());
        let status = Arc::new(AtomicI32::new(StatusCode::Success.as_i32()));
        let stop = Arc::new(AtomicBool::new(false));

        let (outbound_tx, outbound_rx) = mpsc::sync_channel::<Frame>(OUTBOUND_QUEUE_CAP);
        let (ack_tx, ack_rx) = mpsc::channel::<Frame>();
        let (delivery_tx, delivery_rx) = mpsc::channel::<DeliveredFrame>();

        let ack_handle = {
            let rf = rf.clone();
            let stop = stop.clone();
            thread::spawn(move || ack::run(rf, ack_rx, stop))
        };

        let receiver_handle = {
            let rf = rf.clone();
            let clock = clock.clone();
            let ack_slot = ack_slot.clone();
            let stop = stop.clone();
            thread::spawn(move || {
                receiver::run(rf, local_mac, clock, ack_slot, ack_tx, delivery_tx, stop)
            })
        };

        let sender_handle = {
            let rf = rf.clone();
            let clock = clock.clone();
            let ack_slot = ack_slot.clone();
            let config = config.clone();
            let status = status.clone();
            let stop = stop.clone();
            thread::spawn(move || sender::run(rf, outbound_rx, clock, ack_slot, config, status, stop))
        };

        Ok(Link {
            local_mac,
            seq_map: Mutex::new(HashMap::new()),
            outbound_tx,
            delivery_rx: Mutex::new(delivery_rx),
            status,
            clock,
            config,
            stop,
            sender_handle: Some(sender_handle),
            receiver_handle: Some(receiver_handle),
            ack_handle: Some(ack_handle),
        })
    }

    /// Queues `data[..len]` for transmission to `dest`.
    pub fn send(&self, dest: u16, data: &[u8], len: i32) -> i32 {
        if len < 0 {
            self.set_status(StatusCode::BadBufSize);
            return 0;
        }

        let effective_len = (data.len()).min(len as usize);
        let payload = data[..effective_len].to_vec();

        let seq = {
            let mut map = self.seq_map.lock().unwrap();
            let next = map.entry(dest).or_insert(0);
            let seq = *next;
            *next = (*next + 1) % 4096;
            seq
        };

        let bytes = Frame::encode(FrameType::Data, false, seq, dest, self.local_mac, &payload);
        let frame = match Frame::decode(&bytes) {
            Ok(frame) => frame,
            Err(_) => {
                self.set_status(StatusCode::UnspecifiedError);
                return 0;
            }
        };

        match self.outbound_tx.try_send(frame) {
            Ok(()) => effective_len as i32,
            Err(TrySendError::Full(_)) => {
                self.set_status(StatusCode::InsufficientBufferSpace);
                0
            }
            Err(TrySendError::Disconnected(_)) => {
                self.set_status(StatusCode::UnspecifiedError);
                0
            }
        }
    }

    /// Blocks for the next delivered DATA payload.
    pub fn recv(&self, out: &mut DeliveredFrame) -> i32 {
        let rx = self.delivery_rx.lock().unwrap();
        match rx.recv() {
            Ok(delivered) => {
                let len = delivered.payload.len() as i32;
                *out = delivered;
                len
            }
            Err(_) => -1,
        }
    }

    pub fn status(&self) -> i32 {
        self.status.load(Ordering::SeqCst)
    }

    fn set_status(&self, code: StatusCode) {
        self.status.store(code.as_i32(), Ordering::SeqCst);
    }

    /// Configuration RPC. Always returns 0.
    pub fn command(&self, cmd: i32, val: i32) -> i32 {
        match cmd {
            0 => {
                info!(
                    "commands: 0=help 1=debug-level(0/1/2) 2=slot-selection(0=random/else=deterministic) 3=beacon-interval-seconds(>=0 or -1=disable)"
                );
            }
            1 => match val {
                0 => self.config.set_debug_level(DebugLevel::None),
                1 => self.config.set_debug_level(DebugLevel::Errors),
                2 => self.config.set_debug_level(DebugLevel::Full),
                _ => self.set_status(StatusCode::IllegalArgument),
            },
            2 => {
                if val == 0 {
                    self.config.set_slot_selection(SlotSelection::Random);
                } else {
                    self.config.set_slot_selection(SlotSelection::DeterministicMax);
                }
            }
            3 => {
                if val >= 0 {
                    self.clock.set_interval_ms(val as i64 * 1000);
                } else if val == -1 {
                    self.clock.set_interval_ms(-1);
                } else {
                    self.set_status(StatusCode::IllegalArgument);
                }
            }
            _ => self.set_status(StatusCode::IllegalArgument),
        }
        0
    }

    /// Requests that all three actors stop at their next loop head. An
    /// in-flight `rf.receive()` may outlast this call.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        for handle in [
            self.sender_handle.take(),
            self.receiver_handle.take(),
            self.ack_handle.take(),
        ] {
            if let Some(handle) = handle {
                let _ = handle.join();
            }
        }
    }
}

impl Drop for Link {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}
