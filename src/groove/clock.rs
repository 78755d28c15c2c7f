// Beat Clock - Step grid to absolute time
// Converts step indices on a fixed-resolution grid into seconds for a given tempo

use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, GenerationResult};

/// Beats per bar (4/4 time is assumed throughout)
pub const BEATS_PER_BAR: u32 = 4;

/// Convert a step index into seconds
///
/// `step / steps_per_beat * (60 / bpm)`. Rejects a zero tempo and a
/// non-positive or non-finite grid resolution.
pub fn time_of(step: u32, steps_per_beat: f64, bpm: u32) -> GenerationResult<f64> {
    let clock = BeatClock::new(bpm, steps_per_beat)?;
    Ok(clock.time_of(step))
}

/// Validated tempo + grid resolution pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeatClock {
    /// Beats per minute
    bpm: u32,

    /// Grid steps per beat (2.0 = eighth notes, 4.0 = sixteenth notes)
    steps_per_beat: f64,
}

impl BeatClock {
    /// Create a new clock, rejecting values that cannot describe a grid
    pub fn new(bpm: u32, steps_per_beat: f64) -> GenerationResult<Self> {
        if bpm == 0 {
            return Err(GenerationError::InvalidParameter(
                "tempo must be greater than 0 BPM".to_string(),
            ));
        }
        if !steps_per_beat.is_finite() || steps_per_beat <= 0.0 {
            return Err(GenerationError::InvalidParameter(format!(
                "steps per beat must be positive, got {}",
                steps_per_beat
            )));
        }

        Ok(BeatClock { bpm, steps_per_beat })
    }

    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    pub fn steps_per_beat(&self) -> f64 {
        self.steps_per_beat
    }

    /// Duration of one beat in seconds
    pub fn seconds_per_beat(&self) -> f64 {
        60.0 / self.bpm as f64
    }

    /// Duration of one 4/4 bar in seconds
    pub fn seconds_per_bar(&self) -> f64 {
        self.seconds_per_beat() * BEATS_PER_BAR as f64
    }

    /// Number of grid steps in one bar
    pub fn steps_per_bar(&self) -> f64 {
        self.steps_per_beat * BEATS_PER_BAR as f64
    }

    /// Absolute time of a step in seconds
    pub fn time_of(&self, step: u32) -> f64 {
        step as f64 / self.steps_per_beat * self.seconds_per_beat()
    }

    /// Duration of a run of steps in seconds
    pub fn steps_duration(&self, steps: f64) -> f64 {
        steps / self.steps_per_beat * self.seconds_per_beat()
    }

    /// Start time of a bar (0-indexed)
    pub fn bar_start(&self, bar: u32) -> f64 {
        bar as f64 * self.seconds_per_bar()
    }

    /// Number of whole bars needed to hold `steps` grid steps
    pub fn bars_for_steps(&self, steps: u32) -> u32 {
        (steps as f64 / self.steps_per_bar()).ceil() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_of_zero_is_zero() {
        assert_eq!(time_of(0, 2.0, 120).unwrap(), 0.0);
        assert_eq!(time_of(0, 4.0, 93).unwrap(), 0.0);
    }

    #[test]
    fn test_time_of_120_bpm() {
        // At 120 BPM each beat is 0.5s; 2 steps per beat -> 0.25s per step
        assert!((time_of(4, 2.0, 120).unwrap() - 1.0).abs() < 1e-9);
        // 4 steps per beat -> 0.125s per step
        assert!((time_of(4, 4.0, 120).unwrap() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_time_of_rejects_bad_input() {
        assert!(matches!(
            time_of(1, 2.0, 0),
            Err(GenerationError::InvalidParameter(_))
        ));
        assert!(matches!(
            time_of(1, 0.0, 120),
            Err(GenerationError::InvalidParameter(_))
        ));
        assert!(matches!(
            time_of(1, -1.0, 120),
            Err(GenerationError::InvalidParameter(_))
        ));
        assert!(time_of(1, f64::NAN, 120).is_err());
    }

    #[test]
    fn test_time_of_monotonic() {
        for bpm in [60, 97, 120, 174] {
            let clock = BeatClock::new(bpm, 2.0).unwrap();
            let mut last = clock.time_of(0);
            for step in 1..64 {
                let t = clock.time_of(step);
                assert!(t >= last, "step {} went backwards at {} BPM", step, bpm);
                last = t;
            }
        }
    }

    #[test]
    fn test_bar_helpers() {
        let clock = BeatClock::new(120, 2.0).unwrap();

        // 4/4 at 120 BPM -> 2 seconds per bar
        assert!((clock.seconds_per_bar() - 2.0).abs() < 1e-9);
        assert!((clock.bar_start(3) - 6.0).abs() < 1e-9);
        assert_eq!(clock.steps_per_bar(), 8.0);

        // A 16-step pattern on an eighth-note grid spans two bars
        assert_eq!(clock.bars_for_steps(16), 2);
        assert_eq!(clock.bars_for_steps(17), 3);
        assert_eq!(clock.bars_for_steps(0), 0);
    }
}
