/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! One-shot hardware timer seam and its platform limits.

use super::error::HwTimerError;

// ── Constants ─────────────────────────────────────────────────────────────────

/// Default RTC frequency (32.768 kHz low-frequency clock).
pub const DEFAULT_TICK_HZ: u32 = 32_768;

/// Default minimum single-shot timeout accepted by the hardware.
pub const DEFAULT_MIN_TIMEOUT_TICKS: u32 = 5;

/// Default maximum single-shot timeout (full 24-bit RTC range).
pub const DEFAULT_MAX_TIMEOUT_TICKS: u32 = 0x00FF_FFFF;

// ── HwTimerMode ───────────────────────────────────────────────────────────────

/// Mode the hardware resource is created in.
///
/// [`ModelTimer`](super::ModelTimer) always uses `SingleShot`; repetition is
/// synthesised in software so that chunking applies to every cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwTimerMode {
    SingleShot,
    Repeated,
}

// ── HardwareTimer ─────────────────────────────────────────────────────────────

/// A single hardware (or OS) timer resource that can count down a bounded
/// number of ticks per arm.
///
/// When an armed countdown expires the platform must call
/// [`ModelTimer::on_expiry`](super::ModelTimer::on_expiry) on the handle that
/// owns this resource; that call is the trampoline binding the resource to
/// the handle's callback.
///
/// Implementations must be safe to call from the context the owning model
/// runs in (interrupt-safe on target).
pub trait HardwareTimer {
    /// Bind the resource.  Called once per [`ModelTimer::create`](super::ModelTimer::create).
    fn create(&mut self, mode: HwTimerMode) -> Result<(), HwTimerError>;

    /// Arm the resource to expire `ticks` ticks from now.
    fn start(&mut self, ticks: u32) -> Result<(), HwTimerError>;

    /// Disarm the resource.  Stopping an idle resource is not an error.
    fn stop(&mut self) -> Result<(), HwTimerError>;
}

impl<T: HardwareTimer + ?Sized> HardwareTimer for Box<T> {
    fn create(&mut self, mode: HwTimerMode) -> Result<(), HwTimerError> {
        (**self).create(mode)
    }

    fn start(&mut self, ticks: u32) -> Result<(), HwTimerError> {
        (**self).start(ticks)
    }

    fn stop(&mut self) -> Result<(), HwTimerError> {
        (**self).stop()
    }
}

// ── TimerLimits ───────────────────────────────────────────────────────────────

/// Platform constants describing what a single hardware arm can represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerLimits {
    /// Smallest timeout the hardware accepts.
    pub min_timeout_ticks: u32,

    /// Largest timeout the hardware accepts in a single arm.
    pub max_timeout_ticks: u32,

    /// Counter frequency, used for millisecond ↔ tick conversion.
    pub tick_hz: u32,
}

impl Default for TimerLimits {
    fn default() -> Self {
        Self {
            min_timeout_ticks: DEFAULT_MIN_TIMEOUT_TICKS,
            max_timeout_ticks: DEFAULT_MAX_TIMEOUT_TICKS,
            tick_hz: DEFAULT_TICK_HZ,
        }
    }
}

impl TimerLimits {
    /// Largest chunk armed while a long timeout is being split.
    ///
    /// Two minimum-timeout margins below the hardware ceiling, so that the
    /// leftover after subtracting one chunk from anything above the ceiling
    /// is still longer than the hardware minimum.
    pub fn max_chunk_ticks(&self) -> u32 {
        self.max_timeout_ticks
            .saturating_sub(self.min_timeout_ticks.saturating_mul(2))
    }

    /// Convert milliseconds to ticks, rounding to the nearest tick and
    /// saturating at `u32::MAX`.
    pub fn ms_to_ticks(&self, ms: u32) -> u32 {
        let ticks = (u64::from(ms) * u64::from(self.tick_hz) + 500) / 1_000;
        u32::try_from(ticks).unwrap_or(u32::MAX)
    }

    /// Convert a tick count to whole milliseconds (truncating).
    pub fn ticks_to_ms(&self, ticks: u64) -> u64 {
        if self.tick_hz == 0 {
            return 0;
        }
        (u128::from(ticks) * 1_000 / u128::from(self.tick_hz)) as u64
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
