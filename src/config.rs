//! Runtime-tunable link configuration, driven by `command()`.
//!
//! A plain struct of atomics rather than a `Mutex`-guarded
//! `Default`-initialized record, since `command()` mutates it from the
//! host thread while Sender/Receiver read it concurrently.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// `command 1` debug level, with an explicit match arm per value so
/// `Errors` and `Full` never collapse into the same behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DebugLevel {
    None = 0,
    Errors = 1,
    Full = 2,
}

impl DebugLevel {
    fn from_u8(v: u8) -> Option<DebugLevel> {
        match v {
            0 => Some(DebugLevel::None),
            1 => Some(DebugLevel::Errors),
            2 => Some(DebugLevel::Full),
            _ => None,
        }
    }
}

/// `command 2` slot-selection mode for CSMA/CA backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotSelection {
    /// Uniform random draw on `[0, cw)`.
    Random,
    /// Deterministic maximum (`cw - 1`), for reproducible collisions in tests.
    DeterministicMax,
}

/// Shared, atomically-mutable link configuration.
#[derive(Debug)]
pub struct LinkConfig {
    debug_level: AtomicU8,
    deterministic_slots: AtomicBool,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            debug_level: AtomicU8::new(DebugLevel::None as u8),
            deterministic_slots: AtomicBool::new(false),
        }
    }
}

impl LinkConfig {
    pub fn debug_level(&self) -> DebugLevel {
        DebugLevel::from_u8(self.debug_level.load(Ordering::Relaxed)).unwrap_or(DebugLevel::None)
    }

    pub fn set_debug_level(&self, level: DebugLevel) {
        self.debug_level.store(level as u8, Ordering::Relaxed);
    }

    pub fn slot_selection(&self) -> SlotSelection {
        if self.deterministic_slots.load(Ordering::Relaxed) {
            SlotSelection::DeterministicMax
        } else {
            SlotSelection::Random
        }
    }

    pub fn set_slot_selection(&self, mode: SlotSelection) {
        self.deterministic_slots
            .store(mode == SlotSelection::DeterministicMax, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_level_round_trips() {
        let cfg = LinkConfig::default();
        assert_eq!(cfg.debug_level(), DebugLevel::None);
        cfg.set_debug_level(DebugLevel::Errors);
        assert_eq!(cfg.debug_level(), DebugLevel::Errors);
        cfg.set_debug_level(DebugLevel::Full);
        assert_eq!(cfg.debug_level(), DebugLevel::Full);
    }

    #[test]
    fn slot_selection_round_trips() {
        let cfg = LinkConfig::default();
        assert_eq!(cfg.slot_selection(), SlotSelection::Random);
        cfg.set_slot_selection(SlotSelection::DeterministicMax);
        assert_eq!(cfg.slot_selection(), SlotSelection::DeterministicMax);
    }
}
