/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error types for the model timer.
//!
//! Two error enums model the two failure layers:
//!
//! * [`HwTimerError`]: what the underlying one-shot hardware timer reported
//!   (low-level, carries the exact tick values it refused).
//! * [`TimerError`]: returned from
//!   [`ModelTimer::create()`](super::ModelTimer::create) and
//!   [`ModelTimer::schedule()`](super::ModelTimer::schedule).
//!
//! A hardware failure while re-arming a chunk from inside the expiry handler
//! is *not* represented here; it is logged and asserted on instead.

use thiserror::Error;

// ── Hardware layer ────────────────────────────────────────────────────────────

/// Failure reported by a [`HardwareTimer`](super::HardwareTimer)
/// implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HwTimerError {
    /// `start` was called before `create` bound the resource.
    #[error("hardware timer used before it was created")]
    NotCreated,

    /// The requested single-shot duration is outside what the peripheral can
    /// count.
    #[error("{ticks} ticks is outside the hardware range [{min}, {max}]")]
    OutOfRange { ticks: u32, min: u32, max: u32 },
}

// ── Model timer layer ─────────────────────────────────────────────────────────

/// Error type returned by the fallible [`ModelTimer`](super::ModelTimer)
/// operations.
///
/// | Variant | Cause |
/// |---|---|
/// | `NullArgument` | no callback bound to the handle |
/// | `InvalidParameter` | timeout shorter than the hardware minimum |
/// | `Hardware` | the first chunk could not be armed / resource not created |
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    /// The handle has no callback.
    ///
    /// Handles are references and cannot be null, so a missing callback is
    /// the only way to hit this.
    #[error("timer has no callback bound")]
    NullArgument,

    /// The requested timeout is below the hardware's minimum representable
    /// single-shot timeout.
    #[error("timeout of {requested} ticks is below the hardware minimum of {minimum} ticks")]
    InvalidParameter { requested: u32, minimum: u32 },

    /// The hardware timer refused the request.
    #[error("hardware timer error: {0}")]
    Hardware(#[from] HwTimerError),
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_parameter_message_carries_values() {
        let err = TimerError::InvalidParameter {
            requested: 3,
            minimum: 5,
        };
        let msg = err.to_string();
        assert!(msg.contains('3') && msg.contains('5'), "got: {msg}");
    }

    #[test]
    fn hardware_error_converts_with_question_mark() {
        fn arm() -> Result<(), TimerError> {
            Err(HwTimerError::NotCreated)?;
            Ok(())
        }
        assert_eq!(arm(), Err(TimerError::Hardware(HwTimerError::NotCreated)));
    }
}
