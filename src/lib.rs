//! A threaded 802.11-style medium-access-control (MAC) link layer
//! sitting atop an external RF/PHY transport (the [`Rf`] trait).
//!
//! The core performs framing, CSMA/CA with binary exponential backoff,
//! per-unicast positive acknowledgement with retransmission,
//! beacon-driven time synchronization, and inbound filtering/dispatch.
//! Encryption, association/authentication, fragmentation, multi-rate
//! adaptation, power save, and management frames beyond beacons are out
//! of scope.
//!
//! The crate's three long-lived actors (Sender, Receiver, Acknowledger)
//! and the [`mac::Link`] controller that owns them are built around
//! `std::thread` + channels, since the RF contract's blocking
//! `receive()` and timing waits are naturally expressed as suspension
//! points on real threads rather than a cooperative poll loop.

pub mod clock;
pub mod config;
pub mod error;
pub mod frame;
pub mod mac;
pub mod rf;

pub use error::{LinkError, StatusCode};
pub use frame::{Frame, FrameType, BROADCAST_ADDR};
pub use mac::{DeliveredFrame, Link};
pub use rf::{Rf, RfConstants};
