/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Chunked software timer for mesh models.
//!
//! [`ModelTimer`] schedules a callback an arbitrary number of ticks in the
//! future on top of a [`HardwareTimer`] that can only count down
//! [`TimerLimits::max_timeout_ticks`] per arm.  Long timeouts are split into
//! consecutive chunks; the callback only runs once the whole requested
//! duration has elapsed.
//!
//! ```text
//!  schedule(T)                on_expiry        on_expiry        on_expiry
//!      │  arm(max_chunk)          │ arm(max_chunk)  │ arm(rest)       │ callback()
//!      ├──────────────────────────┼─────────────────┼─────────────────┤
//!      0                                                              T
//! ```
//!
//! # Reentrancy
//! The callback receives `&mut ModelTimer` and may call
//! [`schedule`](ModelTimer::schedule) or [`abort`](ModelTimer::abort) on it.
//! A schedule issued from inside the callback never arms the hardware
//! directly: it resets the bookkeeping and the re-arm happens once the
//! callback returns, so the timer can never be armed twice.
//!
//! # Fatal errors
//! Re-arming a chunk from inside [`on_expiry`](ModelTimer::on_expiry) cannot
//! fail as long as the hardware honours its own [`TimerLimits`]; if it does
//! fail anyway the error is logged and `debug_assert!` fires.

pub mod error;
pub mod hardware;

pub use error::{HwTimerError, TimerError};
pub use hardware::{HardwareTimer, HwTimerMode, TimerLimits};

use std::fmt;

use tracing::{debug, error, trace, warn};

use crate::clock::{TickClock, TickValue};

// ── Modes and callbacks ───────────────────────────────────────────────────────

/// Whether the callback fires once or keeps firing every `timeout_ticks`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerMode {
    #[default]
    SingleShot,
    Repeated,
}

/// What the timer does with the callback after it returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackControl {
    /// Keep the callback bound (normal case).
    Keep,
    /// Drop the callback.  Unless the callback bound a replacement, no
    /// further firing follows.
    Release,
}

/// Callback signature: the owned context plus the timer that fired.
pub type TimerHandler<H, C, T> = fn(&mut T, &mut ModelTimer<H, C, T>) -> CallbackControl;

/// A function reference together with the context it is invoked with.
pub struct TimerCallback<H, C, T> {
    handler: TimerHandler<H, C, T>,
    context: T,
}

impl<H, C, T> TimerCallback<H, C, T> {
    pub fn new(handler: TimerHandler<H, C, T>, context: T) -> Self {
        Self { handler, context }
    }

    pub fn context(&self) -> &T {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut T {
        &mut self.context
    }

    pub fn into_context(self) -> T {
        self.context
    }
}

// ── ModelTimer ────────────────────────────────────────────────────────────────

/// One schedulable wake-up, owned exclusively by one model instance.
///
/// Lifecycle: build with [`new`](Self::new), bind a callback, call
/// [`create`](Self::create) once, then [`schedule`](Self::schedule) /
/// [`abort`](Self::abort) as often as needed.  The platform forwards every
/// hardware expiry to [`on_expiry`](Self::on_expiry).
pub struct ModelTimer<H, C, T = ()> {
    hw: H,
    clock: C,
    limits: TimerLimits,

    callback: Option<TimerCallback<H, C, T>>,
    mode: TimerMode,

    /// Requested total duration.
    timeout_ticks: u32,
    /// Ticks still to be armed before the callback is due.
    remaining_ticks: u32,

    last_tick_stamp: TickValue,
    total_elapsed_ticks: u64,

    /// `true` only while the callback executes.
    callback_active: bool,
    /// `true` while a chunk is counting down in hardware.
    armed: bool,
    created: bool,
}

impl<H, C, T> fmt::Debug for ModelTimer<H, C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelTimer")
            .field("limits", &self.limits)
            .field("has_callback", &self.callback.is_some())
            .field("mode", &self.mode)
            .field("timeout_ticks", &self.timeout_ticks)
            .field("remaining_ticks", &self.remaining_ticks)
            .field("last_tick_stamp", &self.last_tick_stamp)
            .field("total_elapsed_ticks", &self.total_elapsed_ticks)
            .field("callback_active", &self.callback_active)
            .field("armed", &self.armed)
            .field("created", &self.created)
            .finish()
    }
}

impl<H: HardwareTimer, C: TickClock, T> ModelTimer<H, C, T> {
    /// Unbound handle: no callback, zero timeout, not created.
    pub fn new(hw: H, clock: C, limits: TimerLimits) -> Self {
        Self {
            hw,
            clock,
            limits,
            callback: None,
            mode: TimerMode::SingleShot,
            timeout_ticks: 0,
            remaining_ticks: 0,
            last_tick_stamp: 0,
            total_elapsed_ticks: 0,
            callback_active: false,
            armed: false,
            created: false,
        }
    }

    // ── Configuration ─────────────────────────────────────────────────────────

    /// Bind `callback`, replacing any previous one.
    ///
    /// Called from inside the running callback, the new one replaces the
    /// in-flight callback once it returns.
    pub fn set_callback(&mut self, callback: TimerCallback<H, C, T>) {
        self.callback = Some(callback);
    }

    /// Remove and return the bound callback.
    pub fn clear_callback(&mut self) -> Option<TimerCallback<H, C, T>> {
        self.callback.take()
    }

    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    /// Set the requested duration.  Takes effect on the next
    /// [`schedule`](Self::schedule), or the next cycle of a repeating timer.
    pub fn set_timeout_ticks(&mut self, ticks: u32) {
        self.timeout_ticks = ticks;
    }

    /// [`set_timeout_ticks`](Self::set_timeout_ticks) with a millisecond value
    /// converted at the platform tick rate.
    pub fn set_timeout_ms(&mut self, ms: u32) {
        self.timeout_ticks = self.limits.ms_to_ticks(ms);
    }

    pub fn set_mode(&mut self, mode: TimerMode) {
        self.mode = mode;
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn timeout_ticks(&self) -> u32 {
        self.timeout_ticks
    }

    pub fn remaining_ticks(&self) -> u32 {
        self.remaining_ticks
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn limits(&self) -> &TimerLimits {
        &self.limits
    }

    pub fn is_callback_active(&self) -> bool {
        self.callback_active
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    /// `true` while a chunk is counting down in hardware.
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Context of the bound callback.  `None` while unbound, and while the
    /// callback itself runs (it receives its context by argument).
    pub fn context(&self) -> Option<&T> {
        self.callback.as_ref().map(TimerCallback::context)
    }

    pub fn context_mut(&mut self) -> Option<&mut T> {
        self.callback.as_mut().map(TimerCallback::context_mut)
    }

    /// Ticks accumulated since the last [`schedule`](Self::schedule),
    /// updated on every hardware expiry.  Chunk boundaries do not affect it.
    pub fn elapsed_ticks(&self) -> u64 {
        self.total_elapsed_ticks
    }

    // ── Operations ────────────────────────────────────────────────────────────

    /// Bind the hardware resource to this handle.
    ///
    /// The hardware is always created in single-shot mode; repetition is
    /// done in software.
    ///
    /// # Errors
    /// * [`TimerError::NullArgument`] – no callback bound.
    /// * [`TimerError::Hardware`] – the resource could not be created.
    pub fn create(&mut self) -> Result<(), TimerError> {
        if self.callback.is_none() {
            return Err(TimerError::NullArgument);
        }

        self.callback_active = false;
        self.hw.create(HwTimerMode::SingleShot)?;
        self.created = true;
        Ok(())
    }

    /// (Re)start the timer for `timeout_ticks`.
    ///
    /// Stops any armed chunk, resets the remaining and elapsed counters and
    /// arms the first chunk.  Called from inside the callback the arming is
    /// deferred until the callback returns.
    ///
    /// # Errors
    /// * [`TimerError::NullArgument`] – no callback bound.
    /// * [`TimerError::InvalidParameter`] – timeout below the hardware minimum.
    /// * [`TimerError::Hardware`] – the first chunk could not be armed.
    pub fn schedule(&mut self) -> Result<(), TimerError> {
        // While the callback runs it is held by `on_expiry`, not by `self`.
        if self.callback.is_none() && !self.callback_active {
            return Err(TimerError::NullArgument);
        }

        if self.timeout_ticks < self.limits.min_timeout_ticks {
            return Err(TimerError::InvalidParameter {
                requested: self.timeout_ticks,
                minimum: self.limits.min_timeout_ticks,
            });
        }

        self.stop_hardware();

        self.remaining_ticks = self.timeout_ticks;
        self.last_tick_stamp = self.clock.tick_now();
        self.total_elapsed_ticks = 0;

        if self.callback_active {
            debug!(
                timeout_ticks = self.timeout_ticks,
                "schedule from callback, arming deferred"
            );
            return Ok(());
        }

        debug!(
            timeout_ticks = self.timeout_ticks,
            mode = ?self.mode,
            "timer scheduled"
        );
        self.arm_next_chunk()?;
        Ok(())
    }

    /// Stop the timer and zero its timeout and counters.  Idempotent.
    ///
    /// A callback already executing runs to completion, but nothing fires
    /// after it.
    pub fn abort(&mut self) {
        self.stop_hardware();
        self.remaining_ticks = 0;
        self.timeout_ticks = 0;
        self.total_elapsed_ticks = 0;
        debug!("timer aborted");
    }

    /// Hardware expiry trampoline.
    ///
    /// Accounts elapsed time, runs the callback once the requested duration
    /// is exhausted, restarts repeating timers and arms the next chunk.
    pub fn on_expiry(&mut self) {
        if !self.armed {
            trace!("spurious expiry on idle timer ignored");
            return;
        }
        self.armed = false;

        let now = self.clock.tick_now();
        let delta = self.clock.tick_delta(now, self.last_tick_stamp);
        self.total_elapsed_ticks += u64::from(delta);
        self.last_tick_stamp = now;

        if self.remaining_ticks == 0 {
            let Some(mut callback) = self.callback.take() else {
                warn!("timer expired without a callback bound");
                return;
            };

            self.callback_active = true;
            let control = (callback.handler)(&mut callback.context, self);
            self.callback_active = false;

            if control == CallbackControl::Keep && self.callback.is_none() {
                self.callback = Some(callback);
            }
            if self.callback.is_none() {
                // Released with no replacement: the timer goes idle.
                self.remaining_ticks = 0;
                return;
            }

            if self.mode == TimerMode::Repeated {
                self.remaining_ticks = self.timeout_ticks;
            }
        }

        if self.remaining_ticks > 0 {
            if let Err(e) = self.arm_next_chunk() {
                error!(
                    error = %e,
                    remaining_ticks = self.remaining_ticks,
                    "failed to re-arm model timer chunk"
                );
                debug_assert!(false, "model timer chunk re-arm failed: {e}");
            }
        }
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    /// Arm the hardware for the next chunk of `remaining_ticks`.
    ///
    /// Anything above the hardware ceiling is split off as a
    /// `max_chunk_ticks` chunk, leaving more than twice the hardware minimum
    /// for the following arm.
    fn arm_next_chunk(&mut self) -> Result<(), HwTimerError> {
        let ticks = if self.remaining_ticks > self.limits.max_timeout_ticks {
            let chunk = self.limits.max_chunk_ticks();
            self.remaining_ticks -= chunk;
            chunk
        } else {
            std::mem::take(&mut self.remaining_ticks)
        };

        trace!(ticks, remaining_ticks = self.remaining_ticks, "arming chunk");
        self.hw.start(ticks)?;
        self.armed = true;
        Ok(())
    }

    fn stop_hardware(&mut self) {
        // Stopping an idle resource is harmless; the result carries nothing
        // the caller could act on.
        let _ = self.hw.stop();
        self.armed = false;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
