//! Reset-cause decoding for crash forensics.
//!
//! The nRF52840 latches why it last reset in `POWER.RESETREAS`. A firmware
//! fault ends in a watchdog bite, a CPU lockup, or the soft reset the panic
//! handler requests, so the next boot can tell the previous run died and
//! say how.

use core::fmt;

// RESETREAS bits (nRF52840 Product Specification, POWER chapter)
const RESETPIN: u32 = 1 << 0;
const DOG: u32 = 1 << 1;
const SREQ: u32 = 1 << 2;
const LOCKUP: u32 = 1 << 3;
const OFF: u32 = 1 << 16;
const LPCOMP: u32 = 1 << 17;
const DIF: u32 = 1 << 18;
const NFC: u32 = 1 << 19;
const VBUS: u32 = 1 << 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResetCause {
    /// No bit set: power-on or brown-out.
    PowerOn,
    ResetPin,
    Watchdog,
    /// `SYSRESETREQ`, e.g. from the panic handler.
    SoftReset,
    Lockup,
    /// Woken from System OFF by a GPIO (the wake button).
    WakeFromOff,
    /// Woken from System OFF by LPCOMP, NFC, VBUS or debug interface.
    OtherWake,
}

impl ResetCause {
    /// Decode a raw `RESETREAS` value. When several bits are latched the
    /// fault ones win.
    pub fn from_resetreas(bits: u32) -> Self {
        if bits & LOCKUP != 0 {
            ResetCause::Lockup
        } else if bits & DOG != 0 {
            ResetCause::Watchdog
        } else if bits & SREQ != 0 {
            ResetCause::SoftReset
        } else if bits & OFF != 0 {
            ResetCause::WakeFromOff
        } else if bits & (LPCOMP | DIF | NFC | VBUS) != 0 {
            ResetCause::OtherWake
        } else if bits & RESETPIN != 0 {
            ResetCause::ResetPin
        } else {
            ResetCause::PowerOn
        }
    }

    /// Previous run ended abnormally.
    pub fn is_fault(self) -> bool {
        matches!(
            self,
            ResetCause::Lockup | ResetCause::Watchdog | ResetCause::SoftReset
        )
    }
}

impl fmt::Display for ResetCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResetCause::PowerOn => "power-on",
            ResetCause::ResetPin => "reset pin",
            ResetCause::Watchdog => "watchdog timeout",
            ResetCause::SoftReset => "soft reset (panic)",
            ResetCause::Lockup => "CPU lockup",
            ResetCause::WakeFromOff => "wake from deep sleep",
            ResetCause::OtherWake => "wake from System OFF (non-GPIO)",
        };
        f.write_str(s)
    }
}
