//! Per-pulse effect math: unit jitter, cue pitch and orientation shake.

use meltdown_types::{AudioSpec, JitterSpec, ShakeSpec};
use rand::Rng;

use crate::clock::Tick;
use crate::host::{Offset, Orientation};

/// Orientation delta in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShakeOffset {
    pub yaw: f32,
    pub pitch: f32,
}

impl ShakeOffset {
    /// `base` with this shake applied.
    pub fn apply(&self, base: Orientation) -> Orientation {
        Orientation {
            yaw: base.yaw + self.yaw,
            pitch: base.pitch + self.pitch,
        }
    }
}

/// One independent offset per unit: X and Z in `[-h, +h]`, Y in `[0, v)`.
pub fn jitter_offsets<R: Rng>(rng: &mut R, count: u32, jitter: &JitterSpec) -> Vec<Offset> {
    let h = jitter.horizontal;
    let v = jitter.vertical;
    (0..count)
        .map(|_| Offset {
            dx: if h > 0.0 { rng.gen_range(-h..=h) } else { 0.0 },
            dy: if v > 0.0 { rng.gen_range(0.0..v) } else { 0.0 },
            dz: if h > 0.0 { rng.gen_range(-h..=h) } else { 0.0 },
        })
        .collect()
}

/// Pitch shared by every cue of one pulse, uniform in `[pitch_min, pitch_max)`.
pub fn roll_pitch<R: Rng>(rng: &mut R, audio: &AudioSpec) -> f32 {
    if audio.pitch_max <= audio.pitch_min {
        return audio.pitch_min;
    }
    rng.gen_range(audio.pitch_min..audio.pitch_max)
}

/// Shake at global tick `t`: yaw `A·cos(ωt)`, pitch `A·sin(ωt)`.
pub fn shake_offset(tick: Tick, shake: &ShakeSpec) -> ShakeOffset {
    let phase = tick as f64 * shake.frequency;
    ShakeOffset {
        yaw: (phase.cos() * shake.amplitude) as f32,
        pitch: (phase.sin() * shake.amplitude) as f32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const EPS: f32 = 1e-4;

    #[test]
    fn test_jitter_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let offsets = jitter_offsets(&mut rng, 5_000, &JitterSpec::default());

        assert_eq!(offsets.len(), 5_000);
        for o in &offsets {
            assert!((-2.0..=2.0).contains(&o.dx), "dx out of range: {}", o.dx);
            assert!((0.0..3.0).contains(&o.dy), "dy out of range: {}", o.dy);
            assert!((-2.0..=2.0).contains(&o.dz), "dz out of range: {}", o.dz);
        }
        // Independent per unit, not one shared offset
        assert!(offsets.windows(2).any(|w| w[0] != w[1]));
        // Both sides of the horizontal range get used
        assert!(offsets.iter().any(|o| o.dx < 0.0));
        assert!(offsets.iter().any(|o| o.dx > 0.0));
    }

    #[test]
    fn test_zero_jitter_collapses_to_origin() {
        let mut rng = StdRng::seed_from_u64(1);
        let jitter = JitterSpec {
            horizontal: 0.0,
            vertical: 0.0,
        };
        let offsets = jitter_offsets(&mut rng, 3, &jitter);
        assert!(offsets.iter().all(|o| *o == Offset::default()));
    }

    #[test]
    fn test_pitch_in_half_open_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let audio = AudioSpec::default();
        for _ in 0..5_000 {
            let pitch = roll_pitch(&mut rng, &audio);
            assert!((0.6..1.0).contains(&pitch), "pitch out of range: {pitch}");
        }
    }

    #[test]
    fn test_shake_formula_at_sample_ticks() {
        let shake = ShakeSpec::default();
        for t in [0u64, 1, 50, 99] {
            let offset = shake_offset(t, &shake);
            let expected_yaw = (8.0 * (0.4 * t as f64).cos()) as f32;
            let expected_pitch = (8.0 * (0.4 * t as f64).sin()) as f32;
            assert!((offset.yaw - expected_yaw).abs() < EPS, "yaw at t={t}");
            assert!((offset.pitch - expected_pitch).abs() < EPS, "pitch at t={t}");
        }
    }

    #[test]
    fn test_shake_at_tick_zero_is_pure_yaw() {
        let offset = shake_offset(0, &ShakeSpec::default());
        assert!((offset.yaw - 8.0).abs() < EPS);
        assert!(offset.pitch.abs() < EPS);
    }

    #[test]
    fn test_shake_applies_to_base_orientation() {
        let base = Orientation {
            yaw: 90.0,
            pitch: -10.0,
        };
        let shaken = ShakeOffset {
            yaw: 2.5,
            pitch: -1.0,
        }
        .apply(base);
        assert_eq!(shaken.yaw, 92.5);
        assert_eq!(shaken.pitch, -11.0);
    }
}
