/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Model common – shared plumbing for Bluetooth mesh server models
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── clock        – tick counter abstraction, wraparound-safe deltas
//! ├── timer/       – chunked model timer over a limited one-shot hardware timer
//! │   ├── hardware – HardwareTimer trait and platform limits
//! │   └── error    – TimerError / HwTimerError
//! ├── tid          – 6 s transaction (TID) deduplication tracker
//! ├── transition   – transition time and delay byte codecs
//! ├── metadata     – persisted model metadata and lifecycle hooks
//! ├── config/      – YAML platform configuration
//! └── sim          – deterministic host doubles for clock, timer and storage
//! ```
//!
//! Everything runs in a single execution context: the platform forwards
//! hardware expiries to [`timer::ModelTimer::on_expiry`] (or
//! [`tid::TidTracker::on_expiry`]) from the same thread that schedules.

pub mod clock;
pub mod config;
pub mod metadata;
pub mod sim;
pub mod tid;
pub mod timer;
pub mod transition;
