/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Host-side simulation of the platform collaborators.
//!
//! [`SimClock`] and [`SimHwTimer`] replace the RTC and the one-shot hardware
//! timer with deterministic software counterparts.  Time only moves when the
//! caller advances it, either directly or through [`run_for`], which also
//! delivers hardware expiries in order.  [`MemoryConfigStore`] stands in for
//! the flash-backed configuration storage.
//!
//! Handles are cheap clones sharing state through `Rc`, so a test can keep
//! one copy for inspection while the [`ModelTimer`](crate::timer::ModelTimer)
//! owns another.  Everything here is single-threaded, matching the
//! single execution context the timers are specified for.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::trace;

use crate::clock::{counter_mask, TickClock, TickValue, RTC_COUNTER_MASK_24BIT};
use crate::metadata::{ConfigStore, MetadataError, ModelMetadata};
use crate::timer::{HardwareTimer, HwTimerError, HwTimerMode, TimerLimits};

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Manually advanced tick counter with configurable width.
#[derive(Debug, Clone)]
pub struct SimClock {
    ticks: Rc<Cell<TickValue>>,
    mask: u32,
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SimClock {
    /// 24-bit counter starting at zero.
    pub fn new() -> Self {
        Self {
            ticks: Rc::new(Cell::new(0)),
            mask: RTC_COUNTER_MASK_24BIT,
        }
    }

    /// Counter of `bits` width starting at zero.
    pub fn with_counter_bits(bits: u32) -> Self {
        Self {
            ticks: Rc::new(Cell::new(0)),
            mask: counter_mask(bits),
        }
    }

    /// Set the raw counter value (masked to the counter width).
    pub fn set(&self, value: TickValue) {
        self.ticks.set(value & self.mask);
    }

    /// Move time forward by `ticks`, wrapping at the counter width.
    pub fn advance(&self, ticks: u64) {
        let next = (u64::from(self.ticks.get()) + ticks) & u64::from(self.mask);
        self.ticks.set(next as TickValue);
    }
}

impl TickClock for SimClock {
    fn tick_now(&self) -> TickValue {
        self.ticks.get()
    }

    fn counter_mask(&self) -> u32 {
        self.mask
    }
}

// ── SimHwTimer ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Armed {
    started_at: TickValue,
    ticks: u32,
}

#[derive(Debug, Default)]
struct SimTimerState {
    mode: Option<HwTimerMode>,
    armed: Option<Armed>,
    arms: Vec<u32>,
    stops: usize,
}

/// Software one-shot timer enforcing the configured [`TimerLimits`].
#[derive(Debug, Clone)]
pub struct SimHwTimer {
    clock: SimClock,
    limits: TimerLimits,
    state: Rc<RefCell<SimTimerState>>,
}

impl SimHwTimer {
    pub fn new(clock: SimClock, limits: TimerLimits) -> Self {
        Self {
            clock,
            limits,
            state: Rc::new(RefCell::new(SimTimerState::default())),
        }
    }

    /// Mode passed to the last `create`, `None` before creation.
    pub fn created_mode(&self) -> Option<HwTimerMode> {
        self.state.borrow().mode
    }

    pub fn is_armed(&self) -> bool {
        self.state.borrow().armed.is_some()
    }

    /// Every duration passed to `start`, oldest first.
    pub fn arm_history(&self) -> Vec<u32> {
        self.state.borrow().arms.clone()
    }

    pub fn arm_count(&self) -> usize {
        self.state.borrow().arms.len()
    }

    pub fn stop_count(&self) -> usize {
        self.state.borrow().stops
    }

    /// Ticks left until the armed countdown expires, `None` when idle.
    pub fn ticks_until_expiry(&self) -> Option<u32> {
        let armed = self.state.borrow().armed?;
        let elapsed = self.clock.tick_delta(self.clock.tick_now(), armed.started_at);
        Some(armed.ticks.saturating_sub(elapsed))
    }

    /// Disarm as the peripheral does right before raising its interrupt.
    fn expire(&self) {
        self.state.borrow_mut().armed = None;
    }
}

impl HardwareTimer for SimHwTimer {
    fn create(&mut self, mode: HwTimerMode) -> Result<(), HwTimerError> {
        self.state.borrow_mut().mode = Some(mode);
        Ok(())
    }

    fn start(&mut self, ticks: u32) -> Result<(), HwTimerError> {
        let mut state = self.state.borrow_mut();
        if state.mode.is_none() {
            return Err(HwTimerError::NotCreated);
        }
        if ticks < self.limits.min_timeout_ticks || ticks > self.limits.max_timeout_ticks {
            return Err(HwTimerError::OutOfRange {
                ticks,
                min: self.limits.min_timeout_ticks,
                max: self.limits.max_timeout_ticks,
            });
        }
        state.armed = Some(Armed {
            started_at: self.clock.tick_now(),
            ticks,
        });
        state.arms.push(ticks);
        trace!(ticks, "sim timer armed");
        Ok(())
    }

    fn stop(&mut self) -> Result<(), HwTimerError> {
        let mut state = self.state.borrow_mut();
        state.armed = None;
        state.stops += 1;
        Ok(())
    }
}

/// Advance `clock` by `ticks`, delivering every expiry of `hw` that falls
/// inside the interval to `on_expiry`, in order.
///
/// Returns the number of expiries delivered.  Re-arms performed by
/// `on_expiry` are honoured within the same interval.
pub fn run_for(clock: &SimClock, hw: &SimHwTimer, ticks: u64, mut on_expiry: impl FnMut()) -> usize {
    let mut left = ticks;
    let mut fired = 0;
    loop {
        match hw.ticks_until_expiry() {
            Some(due) if u64::from(due) <= left => {
                clock.advance(u64::from(due));
                left -= u64::from(due);
                hw.expire();
                on_expiry();
                fired += 1;
            }
            _ => {
                clock.advance(left);
                return fired;
            }
        }
    }
}

/// Advance straight to the next expiry of `hw` and deliver it.
///
/// Returns `false` (and leaves time untouched) when nothing is armed.
pub fn fire_next(clock: &SimClock, hw: &SimHwTimer, on_expiry: impl FnOnce()) -> bool {
    let Some(due) = hw.ticks_until_expiry() else {
        return false;
    };
    clock.advance(u64::from(due));
    hw.expire();
    on_expiry();
    true
}

// ── MemoryConfigStore ─────────────────────────────────────────────────────────

/// In-memory [`ConfigStore`] recording every operation it receives.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    /// Currently stored metadata record.
    pub metadata: Option<ModelMetadata>,
    /// Number of `clear_stack_config` calls.
    pub stack_clears: usize,
    /// Number of `delete_metadata` calls.
    pub deletes: usize,
    /// When set, every write fails with this message.
    pub fail_writes: Option<String>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load_metadata(&self) -> Option<ModelMetadata> {
        self.metadata
    }

    fn set_metadata(&mut self, metadata: &ModelMetadata) -> Result<(), MetadataError> {
        if let Some(reason) = &self.fail_writes {
            return Err(MetadataError::Store(reason.clone()));
        }
        self.metadata = Some(*metadata);
        Ok(())
    }

    fn delete_metadata(&mut self) -> Result<(), MetadataError> {
        self.deletes += 1;
        self.metadata = None;
        Ok(())
    }

    fn clear_stack_config(&mut self) {
        self.stack_clears += 1;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> TimerLimits {
        TimerLimits {
            min_timeout_ticks: 5,
            max_timeout_ticks: 1_000,
            tick_hz: 1_000,
        }
    }

    #[test]
    fn clock_wraps_at_counter_width() {
        let clock = SimClock::with_counter_bits(8);
        clock.set(250);
        clock.advance(10);
        assert_eq!(clock.tick_now(), 4);
        assert_eq!(clock.tick_delta(4, 250), 10);
    }

    #[test]
    fn clones_share_the_same_counter() {
        let a = SimClock::new();
        let b = a.clone();
        a.advance(123);
        assert_eq!(b.tick_now(), 123);
    }

    #[test]
    fn start_before_create_is_rejected() {
        let clock = SimClock::new();
        let mut hw = SimHwTimer::new(clock, limits());
        assert_eq!(hw.start(10), Err(HwTimerError::NotCreated));
    }

    #[test]
    fn start_outside_limits_is_rejected() {
        let clock = SimClock::new();
        let mut hw = SimHwTimer::new(clock, limits());
        hw.create(HwTimerMode::SingleShot).unwrap();
        assert!(matches!(hw.start(4), Err(HwTimerError::OutOfRange { .. })));
        assert!(matches!(hw.start(1_001), Err(HwTimerError::OutOfRange { .. })));
        assert!(hw.start(1_000).is_ok());
    }

    #[test]
    fn run_for_delivers_expiry_inside_interval() {
        let clock = SimClock::new();
        let mut hw = SimHwTimer::new(clock.clone(), limits());
        hw.create(HwTimerMode::SingleShot).unwrap();
        hw.start(100).unwrap();

        let mut hits = 0;
        assert_eq!(run_for(&clock, &hw, 99, || hits += 1), 0);
        assert_eq!(clock.tick_now(), 99);
        assert_eq!(run_for(&clock, &hw, 50, || hits += 1), 1);
        assert_eq!(hits, 1);
        assert_eq!(clock.tick_now(), 149);
        assert!(!hw.is_armed());
    }

    #[test]
    fn stop_disarms() {
        let clock = SimClock::new();
        let mut hw = SimHwTimer::new(clock.clone(), limits());
        hw.create(HwTimerMode::SingleShot).unwrap();
        hw.start(100).unwrap();
        hw.stop().unwrap();
        assert!(!hw.is_armed());
        assert!(!fire_next(&clock, &hw, || panic!("must not fire")));
        assert_eq!(hw.stop_count(), 1);
    }

    #[test]
    fn memory_store_can_simulate_write_failures() {
        let mut store = MemoryConfigStore::new();
        store.fail_writes = Some("flash full".into());
        let err = store.set_metadata(&ModelMetadata::default()).unwrap_err();
        assert_eq!(err, MetadataError::Store("flash full".into()));
        assert!(store.metadata.is_none());
    }
}
