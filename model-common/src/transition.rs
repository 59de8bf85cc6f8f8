/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Wire codecs for the generic transition time and delay fields.
//!
//! # Transition time
//! One byte, bit-exact with the mesh model wire format:
//!
//! ```text
//!   7   6   5   4   3   2   1   0
//! ┌───────┬───────────────────────┐
//! │ tier  │      step count       │   step count 0..=62, 63 = unknown
//! └───────┴───────────────────────┘
//!  00 → 100 ms   01 → 1 s   10 → 10 s   11 → 10 min
//! ```
//!
//! Encoding truncates toward zero and always picks the finest tier that can
//! hold the value, so `decode(encode(ms)) <= ms` and the error is below one
//! step of the chosen tier.
//!
//! # Delay
//! One byte counting 5 ms steps; encoding saturates at 255 steps.

// ── Constants ─────────────────────────────────────────────────────────────────

/// Mask selecting the tier (resolution) bits.
pub const TRANSITION_TIME_STEP_MASK: u8 = 0xC0;

/// Mask selecting the step count.
pub const TRANSITION_TIME_STEPS_MASK: u8 = 0x3F;

pub const TRANSITION_TIME_STEP_RESOLUTION_100MS: u8 = 0x00;
pub const TRANSITION_TIME_STEP_RESOLUTION_1S: u8 = 0x40;
pub const TRANSITION_TIME_STEP_RESOLUTION_10S: u8 = 0x80;
pub const TRANSITION_TIME_STEP_RESOLUTION_10M: u8 = 0xC0;

pub const TRANSITION_TIME_STEP_100MS_FACTOR: u32 = 100;
pub const TRANSITION_TIME_STEP_1S_FACTOR: u32 = 1_000;
pub const TRANSITION_TIME_STEP_10S_FACTOR: u32 = 10 * 1_000;
pub const TRANSITION_TIME_STEP_10M_FACTOR: u32 = 10 * 60 * 1_000;

/// Step-count value reserved for "unknown / not applicable".
pub const TRANSITION_TIME_UNKNOWN: u8 = 0x3F;

/// Largest valid step count.
pub const TRANSITION_TIME_MAX_STEPS: u8 = 0x3E;

/// Largest duration that still encodes to a known value.
///
/// Values in the top step band of the 10 minute tier saturate to
/// [`TRANSITION_TIME_MAX_STEPS`] instead of colliding with the unknown
/// sentinel.
pub const TRANSITION_TIME_MAX_MS: u32 = 63 * TRANSITION_TIME_STEP_10M_FACTOR;

/// Delay step size.
pub const DELAY_TIME_STEP_FACTOR_MS: u32 = 5;

/// Largest encodable delay step count.
pub const DELAY_TIME_STEP_MAX: u8 = 0xFF;

/// Largest representable delay.
pub const DELAY_TIME_MAX_MS: u32 = DELAY_TIME_STEP_MAX as u32 * DELAY_TIME_STEP_FACTOR_MS;

/// Tiers ordered finest first.
const TIERS: [(u8, u32); 4] = [
    (
        TRANSITION_TIME_STEP_RESOLUTION_100MS,
        TRANSITION_TIME_STEP_100MS_FACTOR,
    ),
    (
        TRANSITION_TIME_STEP_RESOLUTION_1S,
        TRANSITION_TIME_STEP_1S_FACTOR,
    ),
    (
        TRANSITION_TIME_STEP_RESOLUTION_10S,
        TRANSITION_TIME_STEP_10S_FACTOR,
    ),
    (
        TRANSITION_TIME_STEP_RESOLUTION_10M,
        TRANSITION_TIME_STEP_10M_FACTOR,
    ),
];

// ── Transition time ───────────────────────────────────────────────────────────

/// Step factor (ms) selected by the tier bits of `encoded`.
pub fn tier_factor_ms(encoded: u8) -> u32 {
    match encoded & TRANSITION_TIME_STEP_MASK {
        TRANSITION_TIME_STEP_RESOLUTION_100MS => TRANSITION_TIME_STEP_100MS_FACTOR,
        TRANSITION_TIME_STEP_RESOLUTION_1S => TRANSITION_TIME_STEP_1S_FACTOR,
        TRANSITION_TIME_STEP_RESOLUTION_10S => TRANSITION_TIME_STEP_10S_FACTOR,
        _ => TRANSITION_TIME_STEP_10M_FACTOR,
    }
}

/// Decode a transition time byte to milliseconds.
///
/// Returns `None` when the step count is the unknown sentinel, whatever the
/// tier bits say.
pub fn transition_time_decode(encoded: u8) -> Option<u32> {
    let steps = encoded & TRANSITION_TIME_STEPS_MASK;
    if steps == TRANSITION_TIME_UNKNOWN {
        return None;
    }
    Some(u32::from(steps) * tier_factor_ms(encoded))
}

/// Encode milliseconds into a transition time byte.
///
/// Durations above [`TRANSITION_TIME_MAX_MS`] encode to
/// [`TRANSITION_TIME_UNKNOWN`].
pub fn transition_time_encode(ms: u32) -> u8 {
    for (resolution, factor) in TIERS {
        let steps = ms / factor;
        if steps <= u32::from(TRANSITION_TIME_MAX_STEPS) {
            return resolution | steps as u8;
        }
    }

    if ms <= TRANSITION_TIME_MAX_MS {
        TRANSITION_TIME_STEP_RESOLUTION_10M | TRANSITION_TIME_MAX_STEPS
    } else {
        TRANSITION_TIME_UNKNOWN
    }
}

/// `false` only for the unknown sentinel (in any tier).
pub fn transition_time_is_valid(encoded: u8) -> bool {
    encoded & TRANSITION_TIME_STEPS_MASK != TRANSITION_TIME_UNKNOWN
}

// ── Delay ─────────────────────────────────────────────────────────────────────

/// Decode a delay byte to milliseconds.
pub fn delay_decode(encoded: u8) -> u32 {
    u32::from(encoded) * DELAY_TIME_STEP_FACTOR_MS
}

/// Encode milliseconds into a delay byte, truncating to 5 ms steps and
/// saturating at [`DELAY_TIME_MAX_MS`].
pub fn delay_encode(ms: u32) -> u8 {
    (ms.min(DELAY_TIME_MAX_MS) / DELAY_TIME_STEP_FACTOR_MS) as u8
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const FACTORS: [u32; 4] = [100, 1_000, 10_000, 600_000];

    // ── decode ────────────────────────────────────────────────────────────────

    #[test]
    fn decode_is_linear_in_every_tier() {
        for (tier, factor) in FACTORS.iter().enumerate() {
            for steps in 0..=62u8 {
                let byte = ((tier as u8) << 6) | steps;
                assert_eq!(
                    transition_time_decode(byte),
                    Some(u32::from(steps) * factor),
                    "byte {byte:#04x}"
                );
            }
        }
    }

    #[test]
    fn unknown_steps_decode_to_none_in_every_tier() {
        for tier in 0..4u8 {
            let byte = (tier << 6) | TRANSITION_TIME_UNKNOWN;
            assert_eq!(transition_time_decode(byte), None);
            assert!(!transition_time_is_valid(byte));
        }
    }

    #[test]
    fn every_byte_decodes_without_panicking() {
        for byte in 0..=u8::MAX {
            let valid = transition_time_is_valid(byte);
            assert_eq!(transition_time_decode(byte).is_some(), valid);
        }
    }

    #[test]
    fn decode_known_wire_values() {
        assert_eq!(transition_time_decode(0x00), Some(0));
        assert_eq!(transition_time_decode(0x0A), Some(1_000)); // 10 × 100 ms
        assert_eq!(transition_time_decode(0x45), Some(5_000)); // 5 × 1 s
        assert_eq!(transition_time_decode(0x83), Some(30_000)); // 3 × 10 s
        assert_eq!(transition_time_decode(0xFE), Some(62 * 600_000));
    }

    // ── encode ────────────────────────────────────────────────────────────────

    #[test]
    fn encode_picks_finest_tier() {
        assert_eq!(transition_time_encode(0), 0x00);
        assert_eq!(transition_time_encode(100), 0x01);
        assert_eq!(transition_time_encode(6_200), 0x3E);
        assert_eq!(transition_time_encode(7_000), 0x47);
        assert_eq!(transition_time_encode(62_000), 0x40 | 62);
        assert_eq!(transition_time_encode(63_000), 0x80 | 6);
        assert_eq!(transition_time_encode(630_000), 0xC0 | 1);
    }

    #[test]
    fn encode_truncates_toward_zero() {
        assert_eq!(transition_time_encode(199), 0x01);
        assert_eq!(transition_time_encode(6_299), 0x3E);
        assert_eq!(transition_time_encode(7_999), 0x47);
    }

    #[test]
    fn encode_above_maximum_is_unknown() {
        for ms in [TRANSITION_TIME_MAX_MS + 1, 40_000_000, u32::MAX] {
            let byte = transition_time_encode(ms);
            assert_eq!(byte, TRANSITION_TIME_UNKNOWN, "ms = {ms}");
            assert!(!transition_time_is_valid(byte));
        }
    }

    #[test]
    fn top_of_range_saturates_instead_of_hitting_sentinel() {
        let byte = transition_time_encode(TRANSITION_TIME_MAX_MS);
        assert_eq!(byte, 0xFE);
        assert!(transition_time_is_valid(byte));
    }

    #[test]
    fn round_trip_is_within_one_step_and_never_above() {
        // Dense near tier boundaries, sparse elsewhere.
        let mut samples: Vec<u32> = (0..=70_000).step_by(7).collect();
        samples.extend((0..=TRANSITION_TIME_MAX_MS).step_by(9_973));
        samples.extend([6_199, 6_200, 6_201, 61_999, 62_000, 62_001, 619_999, 620_000]);
        samples.push(TRANSITION_TIME_MAX_MS);

        for ms in samples {
            let byte = transition_time_encode(ms);
            let decoded = transition_time_decode(byte).expect("in-range value must be known");
            let step = tier_factor_ms(byte);
            assert!(decoded <= ms, "ms = {ms}, decoded = {decoded}");
            assert!(ms - decoded <= step, "ms = {ms}, decoded = {decoded}, step = {step}");
        }
    }

    #[test]
    fn exact_multiples_round_trip_exactly() {
        for (tier, factor) in FACTORS.iter().enumerate() {
            for steps in 0..=62u32 {
                let ms = steps * factor;
                let decoded = transition_time_decode(transition_time_encode(ms)).unwrap();
                assert_eq!(decoded, ms, "tier {tier}, steps {steps}");
            }
        }
    }

    // ── delay ─────────────────────────────────────────────────────────────────

    #[test]
    fn delay_decode_is_five_ms_steps() {
        assert_eq!(delay_decode(0), 0);
        assert_eq!(delay_decode(1), 5);
        assert_eq!(delay_decode(0xFF), 1_275);
    }

    #[test]
    fn delay_encode_truncates() {
        assert_eq!(delay_encode(0), 0);
        assert_eq!(delay_encode(4), 0);
        assert_eq!(delay_encode(5), 1);
        assert_eq!(delay_encode(9), 1);
        assert_eq!(delay_encode(300), 60);
    }

    #[test]
    fn delay_encode_saturates() {
        assert_eq!(delay_encode(DELAY_TIME_MAX_MS), 0xFF);
        assert_eq!(delay_encode(DELAY_TIME_MAX_MS + 1), 0xFF);
        assert_eq!(delay_encode(u32::MAX), 0xFF);
    }

    #[test]
    fn delay_round_trip_never_exceeds_input() {
        for ms in 0..=2_000u32 {
            let decoded = delay_decode(delay_encode(ms));
            assert!(decoded <= ms);
            if ms % DELAY_TIME_STEP_FACTOR_MS == 0 && ms <= DELAY_TIME_MAX_MS {
                assert_eq!(decoded, ms);
            }
        }
    }
}
