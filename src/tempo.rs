// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Virtual tempo derivation.
//!
//! Furnace does not store a BPM. Playback runs at a fixed tick rate with
//! `speed` ticks per row, scaled by the ratio `numerator / denominator`.

use std::fmt;

/// Engine ticks per second.
pub const TICK_RATE: u16 = 60;

/// The tempo fields written to a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualTempo {
    /// Ticks per second.
    pub tick_rate: u16,
    /// Ticks per row. Equal to the requested rows per beat.
    pub speed: u8,
    pub numerator: u16,
    pub denominator: u16,
}

impl VirtualTempo {
    /// Computes the tempo for `bpm` at `rows_per_beat` rows per beat.
    ///
    /// The numerator is the truncated BPM. The denominator is the BPM the
    /// engine would play at with a ratio of 1, rounded half away from zero.
    /// Callers validate that both inputs are positive and that the BPM fits
    /// a u16.
    pub fn new(bpm: f64, rows_per_beat: u8) -> VirtualTempo {
        let speed = rows_per_beat;
        let base_bpm =
            f64::from(TICK_RATE) * 60.0 / (f64::from(speed) * f64::from(rows_per_beat));

        VirtualTempo {
            tick_rate: TICK_RATE,
            speed,
            numerator: bpm.trunc() as u16,
            denominator: base_bpm.round() as u16,
        }
    }
}

impl fmt::Display for VirtualTempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_120_bpm_four_rows() {
        let tempo = VirtualTempo::new(120.0, 4);
        assert_eq!(tempo.tick_rate, 60);
        assert_eq!(tempo.speed, 4);
        assert_eq!(tempo.numerator, 120);
        assert_eq!(tempo.denominator, 225);
        assert_eq!(tempo.to_string(), "120/225");
    }

    #[test]
    fn test_fractional_bpm_truncates() {
        let tempo = VirtualTempo::new(139.9, 4);
        assert_eq!(tempo.numerator, 139);
        assert_eq!(tempo.denominator, 225);
    }

    #[test]
    fn test_denominator_rounding() {
        // 3600 / 9 = 400
        assert_eq!(VirtualTempo::new(100.0, 3).denominator, 400);
        // 3600 / 49 = 73.47
        assert_eq!(VirtualTempo::new(100.0, 7).denominator, 73);
        // 3600 / 64 = 56.25
        assert_eq!(VirtualTempo::new(100.0, 8).denominator, 56);
        // 3600 / 25 = 144
        assert_eq!(VirtualTempo::new(100.0, 5).denominator, 144);
        // 3600 / 1
        assert_eq!(VirtualTempo::new(100.0, 1).denominator, 3600);
    }

    #[test]
    fn test_denominator_ignores_bpm() {
        let slow = VirtualTempo::new(60.0, 4);
        let fast = VirtualTempo::new(180.0, 4);
        assert_eq!(slow.denominator, fast.denominator);
        assert_ne!(slow.numerator, fast.numerator);
    }
}
