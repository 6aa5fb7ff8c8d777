//! The RF/PHY transport contract consumed by the MAC core.
//!
//! The core never talks to a radio directly; it is generic over any
//! [`Rf`] implementation. Framing, timing discipline and retransmission
//! all live above this boundary.

use std::fmt::Debug;

/// Transport-layer constants the RF implementation is responsible for
/// knowing about its own PHY (slot timing, contention window bounds,
/// retry budget).
pub trait RfConstants {
    /// Short inter-frame space, in milliseconds.
    fn a_sifs_time(&self) -> u32;
    /// Slot time, in milliseconds.
    fn a_slot_time(&self) -> u32;
    /// Minimum contention window.
    fn a_cw_min(&self) -> u32;
    /// Maximum contention window.
    fn a_cw_max(&self) -> u32;
    /// Maximum number of retransmission attempts per frame.
    fn dot11_retry_limit(&self) -> u32;
}

/// The RF/PHY transport the MAC core rides on.
///
/// Implementations must be safe to share between the Sender and
/// Acknowledger actors (both may call `transmit` concurrently, per the
/// contract) and the Receiver actor (which alone calls `receive`).
pub trait Rf: RfConstants + Send + Sync + Debug {
    /// Fire-and-forget transmission of a complete, encoded frame.
    fn transmit(&self, bytes: &[u8]);

    /// Blocks until a complete frame is available and returns its bytes.
    fn receive(&self) -> Vec<u8>;

    /// Instantaneous carrier-sense state.
    fn in_use(&self) -> bool;

    /// Monotonic milliseconds, as seen by the RF layer (unsynchronized).
    fn clock(&self) -> u64;
}

/// In-memory `Rf` implementation for tests: every node sharing a
/// [`mock::Medium`] sees every other node's transmissions, letting tests
/// script expected transmit/receive sequences without real hardware.
#[cfg(any(test, feature = "mocks"))]
pub mod mock {
    use super::{Rf, RfConstants};
    use std::collections::VecDeque;
    use std::fmt;
    use std::sync::{Arc, Condvar, Mutex};
    use std::time::{Duration, Instant};

    /// A shared broadcast medium: every [`MockRf`] built from the same
    /// `Medium` receives every other `MockRf`'s transmissions.
    pub struct Medium {
        start: Instant,
        inner: Mutex<Inner>,
        cond: Condvar,
    }

    struct Inner {
        subscribers: Vec<Arc<Mutex<VecDeque<Vec<u8>>>>>,
        busy_until: Option<Instant>,
    }

    impl Medium {
        pub fn new() -> Arc<Self> {
            Arc::new(Self {
                start: Instant::now(),
                inner: Mutex::new(Inner {
                    subscribers: Vec::new(),
                    busy_until: None,
                }),
                cond: Condvar::new(),
            })
        }

        fn now_ms(&self) -> u64 {
            self.start.elapsed().as_millis() as u64
        }

        fn subscribe(&self) -> Arc<Mutex<VecDeque<Vec<u8>>>> {
            let queue = Arc::new(Mutex::new(VecDeque::new()));
            self.inner.lock().unwrap().subscribers.push(queue.clone());
            queue
        }

        fn transmit(&self, from: &Arc<Mutex<VecDeque<Vec<u8>>>>, bytes: &[u8]) {
            let mut inner = self.inner.lock().unwrap();
            inner.busy_until = Some(Instant::now() + Duration::from_millis(1));
            for sub in &inner.subscribers {
                if !Arc::ptr_eq(sub, from) {
                    sub.lock().unwrap().push_back(bytes.to_vec());
                }
            }
            drop(inner);
            self.cond.notify_all();
        }

        fn in_use(&self) -> bool {
            match self.inner.lock().unwrap().busy_until {
                Some(t) => Instant::now() < t,
                None => false,
            }
        }
    }

    /// A node's handle onto a [`Medium`], implementing [`Rf`].
    pub struct MockRf {
        medium: Arc<Medium>,
        queue: Arc<Mutex<VecDeque<Vec<u8>>>>,
        constants: MockConstants,
    }

    #[derive(Clone, Copy, Debug)]
    pub struct MockConstants {
        pub a_sifs_time: u32,
        pub a_slot_time: u32,
        pub a_cw_min: u32,
        pub a_cw_max: u32,
        pub dot11_retry_limit: u32,
    }

    impl Default for MockConstants {
        fn default() -> Self {
            Self {
                a_sifs_time: 10,
                a_slot_time: 20,
                a_cw_min: 15,
                a_cw_max: 1023,
                dot11_retry_limit: 4,
            }
        }
    }

    impl MockRf {
        pub fn new(medium: &Arc<Medium>) -> Self {
            Self::with_constants(medium, MockConstants::default())
        }

        pub fn with_constants(medium: &Arc<Medium>, constants: MockConstants) -> Self {
            let queue = medium.subscribe();
            Self {
                medium: medium.clone(),
                queue,
                constants,
            }
        }
    }

    impl fmt::Debug for MockRf {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("MockRf").finish()
        }
    }

    impl RfConstants for MockRf {
        fn a_sifs_time(&self) -> u32 {
            self.constants.a_sifs_time
        }
        fn a_slot_time(&self) -> u32 {
            self.constants.a_slot_time
        }
        fn a_cw_min(&self) -> u32 {
            self.constants.a_cw_min
        }
        fn a_cw_max(&self) -> u32 {
            self.constants.a_cw_max
        }
        fn dot11_retry_limit(&self) -> u32 {
            self.constants.dot11_retry_limit
        }
    }

    impl Rf for MockRf {
        fn transmit(&self, bytes: &[u8]) {
            self.medium.transmit(&self.queue, bytes);
        }

        fn receive(&self) -> Vec<u8> {
            loop {
                if let Some(frame) = self.queue.lock().unwrap().pop_front() {
                    return frame;
                }
                std::thread::sleep(Duration::from_millis(2));
            }
        }

        fn in_use(&self) -> bool {
            self.medium.in_use()
        }

        fn clock(&self) -> u64 {
            self.medium.now_ms()
        }
    }
}
