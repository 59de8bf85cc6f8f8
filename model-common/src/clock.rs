/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Monotonic tick counter abstraction.
//!
//! The hardware counter backing the model timers is narrower than 32 bits on
//! most radio SoCs (the nRF RTC is 24 bits wide) and wraps silently.  All
//! elapsed-time bookkeeping therefore goes through [`TickClock::tick_delta`],
//! which masks the difference to the counter width.

/// Raw value read from the tick counter.
pub type TickValue = u32;

/// Counter mask for a 24-bit RTC, the default counter width.
pub const RTC_COUNTER_MASK_24BIT: u32 = 0x00FF_FFFF;

/// Mask selecting the low `bits` bits of a tick value.
///
/// `bits` is clamped to `1..=32`.
pub fn counter_mask(bits: u32) -> u32 {
    match bits.clamp(1, 32) {
        32 => u32::MAX,
        b => (1u32 << b) - 1,
    }
}

/// Process-wide, read-only monotonic tick source.
///
/// Nothing in this crate ever writes the clock; implementors only need
/// `&self` access, which keeps a single clock shareable between every timer
/// owned by every model instance.
pub trait TickClock {
    /// Current counter value.
    fn tick_now(&self) -> TickValue;

    /// Mask describing the counter width.  Values returned by
    /// [`tick_now`](Self::tick_now) never have bits set outside this mask.
    fn counter_mask(&self) -> u32 {
        RTC_COUNTER_MASK_24BIT
    }

    /// Ticks elapsed from `earlier` to `later`, correct across a single
    /// counter wraparound.
    fn tick_delta(&self, later: TickValue, earlier: TickValue) -> u32 {
        later.wrapping_sub(earlier) & self.counter_mask()
    }
}

impl<C: TickClock + ?Sized> TickClock for &C {
    fn tick_now(&self) -> TickValue {
        (**self).tick_now()
    }

    fn counter_mask(&self) -> u32 {
        (**self).counter_mask()
    }

    fn tick_delta(&self, later: TickValue, earlier: TickValue) -> u32 {
        (**self).tick_delta(later, earlier)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
