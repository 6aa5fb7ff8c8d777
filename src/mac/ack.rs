//! The Acknowledger actor: a dedicated thread that waits exactly SIFS
//! after dequeuing an ACK, then transmits it without carrier sense, so
//! ACKs preempt DIFS-waiting contenders.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration;

use log::{debug, trace};

use crate::frame::Frame;
use crate::rf::Rf;

pub fn run(rf: Arc<dyn Rf>, queue: Receiver<Frame>, stop: Arc<AtomicBool>) {
    while !stop.load(Ordering::Relaxed) {
        // A short timeout (rather than a blocking `recv`) keeps the stop
        // flag responsive without the Receiver needing a cancellation
        // handshake of its own.
        let frame = match queue.recv_timeout(Duration::from_millis(100)) {
            Ok(frame) => frame,
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => continue,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => return,
        };

        trace!("acknowledger: sending ACK for seq {} to {:#06x}", frame.seq, frame.dest);
        sleep(Duration::from_millis(rf.a_sifs_time() as u64));
        rf.transmit(&frame.to_bytes());
        debug!("acknowledger: ACK for seq {} transmitted", frame.seq);
    }
}
