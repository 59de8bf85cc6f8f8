/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Transaction identifier (TID) deduplication.
//!
//! A transaction is identified by `(src, dst, tid)` plus the transport-level
//! message id.  Retransmissions of the same transaction arrive within a fixed
//! 6 second window after the first packet; those are duplicates and must be
//! absorbed.  Anything else (a changed tuple, a changed message id, or a
//! window that already closed) starts a new transaction.
//!
//! The window is a single-shot [`ModelTimer`] owned by the tracker.  The
//! window is open exactly while that timer has a callback bound; the callback
//! does nothing but release itself.

use tracing::{debug, error};

use crate::clock::TickClock;
use crate::timer::{
    CallbackControl, HardwareTimer, ModelTimer, TimerCallback, TimerError, TimerLimits, TimerMode,
};

/// Length of the TID validation window, fixed by the mesh model layer.
pub const TID_VALIDATION_INTERVAL_MS: u32 = 6_000;

/// Addressing metadata of a received message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RxMeta {
    pub src: u16,
    pub dst: u16,
}

impl RxMeta {
    pub fn new(src: u16, dst: u16) -> Self {
        Self { src, dst }
    }
}

/// Expiry callback: closing the window is releasing the callback.
fn close_window<H, C>(_: &mut (), _: &mut ModelTimer<H, C, ()>) -> CallbackControl {
    CallbackControl::Release
}

/// Per `(source, destination)` transaction tracker.
///
/// One instance per conversation the owning model cares about; trackers
/// share nothing with each other.
#[derive(Debug)]
pub struct TidTracker<H, C> {
    src: u16,
    dst: u16,
    message_id: u32,
    tid: u8,
    new_transaction: bool,
    window_ticks: u32,
    expiry_timer: ModelTimer<H, C, ()>,
}

impl<H: HardwareTimer, C: TickClock> TidTracker<H, C> {
    /// Build a tracker whose window timer runs on `hw`.
    ///
    /// # Errors
    /// [`TimerError::InvalidParameter`] if the 6 second window converts to
    /// fewer ticks than the hardware minimum (a misconfigured tick rate).
    pub fn new(hw: H, clock: C, limits: TimerLimits) -> Result<Self, TimerError> {
        let window_ticks = limits.ms_to_ticks(TID_VALIDATION_INTERVAL_MS);
        if window_ticks < limits.min_timeout_ticks {
            return Err(TimerError::InvalidParameter {
                requested: window_ticks,
                minimum: limits.min_timeout_ticks,
            });
        }

        let mut expiry_timer = ModelTimer::new(hw, clock, limits);
        expiry_timer.set_mode(TimerMode::SingleShot);
        expiry_timer.set_timeout_ticks(window_ticks);

        Ok(Self {
            src: 0,
            dst: 0,
            message_id: 0,
            tid: 0,
            new_transaction: false,
            window_ticks,
            expiry_timer,
        })
    }

    /// Decide whether `(meta, message_id, tid)` starts a new transaction.
    ///
    /// On a new transaction the tracked tuple is overwritten and the window
    /// restarts.  Duplicates leave everything untouched, including the
    /// window, which is never extended by retransmissions.
    pub fn validate(&mut self, meta: &RxMeta, message_id: u32, tid: u8) -> bool {
        let is_new = self.src != meta.src
            || self.dst != meta.dst
            || self.tid != tid
            || self.message_id != message_id
            || !self.is_window_open();

        if is_new {
            self.src = meta.src;
            self.dst = meta.dst;
            self.message_id = message_id;
            self.tid = tid;

            if let Err(e) = self.open_window() {
                error!(error = %e, "failed to start TID validation window");
                // Leave the window closed so the next message is not
                // swallowed as a duplicate of a window that never ran.
                self.expiry_timer.clear_callback();
                debug_assert!(false, "TID window timer failed: {e}");
            }
        }

        self.new_transaction = is_new;

        debug!(
            src = meta.src,
            dst = meta.dst,
            message_id,
            tid,
            new_transaction = is_new,
            "TID validated"
        );

        is_new
    }

    /// Verdict of the last [`validate`](Self::validate) call.
    pub fn is_new(&self) -> bool {
        self.new_transaction
    }

    /// `true` while retransmissions of the tracked transaction are absorbed.
    pub fn is_window_open(&self) -> bool {
        self.expiry_timer.has_callback()
    }

    /// Hardware expiry trampoline for the window timer.
    pub fn on_expiry(&mut self) {
        self.expiry_timer.on_expiry();
    }

    pub fn src(&self) -> u16 {
        self.src
    }

    pub fn dst(&self) -> u16 {
        self.dst
    }

    pub fn message_id(&self) -> u32 {
        self.message_id
    }

    pub fn tid(&self) -> u8 {
        self.tid
    }

    /// Window length in ticks.
    pub fn window_ticks(&self) -> u32 {
        self.window_ticks
    }

    pub fn expiry_timer(&self) -> &ModelTimer<H, C, ()> {
        &self.expiry_timer
    }

    fn open_window(&mut self) -> Result<(), TimerError> {
        self.expiry_timer
            .set_callback(TimerCallback::new(close_window::<H, C>, ()));
        if !self.expiry_timer.is_created() {
            self.expiry_timer.create()?;
        }
        self.expiry_timer.set_timeout_ticks(self.window_ticks);
        self.expiry_timer.schedule()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
