//! Host-testable core of the mouse ring firmware.
//!
//! Everything that decides *what* the ring does lives here: debouncing,
//! scroll acceleration, battery colour, the connection lifecycle, the
//! idle/gesture sleep policy and the runtime loop that ties them together.
//! Hardware reaches it only through `embedded-hal` pins and the small
//! collaborator traits in each module.
//!
//! Usage: `cargo test` (no features) runs the whole state machine on the
//! host against mock pins and sinks.
//!
//! Note: The embedded binary (main.rs, `embedded` feature) binds these
//! traits to Embassy, the SoftDevice and defmt.

#![cfg_attr(not(test), no_std)]

pub mod battery;
pub mod config;
pub mod connection;
pub mod diagnostics;
pub mod error;
pub mod hid;
pub mod input;
pub mod led;
pub mod logging;
pub mod power_logic;
pub mod runtime;
pub mod scroll;
pub mod timer;

pub use error::{BleError, Error};
pub use runtime::{Board, BoardParts, Runtime, Step};

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests
// ═══════════════════════════════════════════════════════════════════════════
