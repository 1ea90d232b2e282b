use anyhow::{ensure, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Inclusive-exclusive millisecond range `[min, max)` sampled uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct MsRange {
    pub min: f64,
    pub max: f64,
}

impl MsRange {
    pub const fn new(min: f64, max: f64) -> Self {
        MsRange { min, max }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        // gen_range panics on an empty range, a fixed duration is just `min`
        if self.max <= self.min {
            self.min
        } else {
            rng.gen_range(self.min..self.max)
        }
    }
}

/// `clamp(min(width, height) / divisor, min, max)`
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct SizeRule {
    pub divisor: f64,
    pub min: f64,
    pub max: f64,
}

impl SizeRule {
    pub const fn new(divisor: f64, min: f64, max: f64) -> Self {
        SizeRule { divisor, min, max }
    }

    pub fn resolve(&self, width: f64, height: f64) -> f64 {
        (width.min(height) / self.divisor).clamp(self.min, self.max)
    }
}

/// Every tunable of a round. Missing fields in `config.json` keep their
/// default through `#[serde(default)]`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GameConfig {
    pub round_seconds: u32,
    pub tick_ms: f64,
    pub points_per_hit: u32,
    pub coins_per_hit: u32,
    pub max_cells: usize,
    pub cell_size: SizeRule,
    pub target_size: SizeRule,
    /// hit radius = target size * factor
    pub hit_radius_factor: f64,
    pub dwell_ms: MsRange,
    pub spawn_interval_ms: MsRange,
    pub first_spawn_delay_ms: f64,
    pub resume_spawn_delay_ms: f64,
    pub volume: f64,
    /// background loop on or off
    pub music: bool,
    /// background loop waits this long after the start cue
    pub music_delay_ms: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            round_seconds: 60,
            tick_ms: 1000.0,
            points_per_hit: 10,
            coins_per_hit: 1,
            max_cells: 100,
            cell_size: SizeRule::new(12.0, 40.0, 80.0),
            target_size: SizeRule::new(8.0, 60.0, 120.0),
            hit_radius_factor: 1.0,
            dwell_ms: MsRange::new(2000.0, 4000.0),
            spawn_interval_ms: MsRange::new(500.0, 1500.0),
            first_spawn_delay_ms: 2100.0,
            resume_spawn_delay_ms: 100.0,
            volume: 0.4,
            music: true,
            music_delay_ms: 2000.0,
        }
    }
}

impl GameConfig {
    pub const PATH: &'static str = "config.json";

    pub fn validate(&self) -> Result<()> {
        ensure!(self.round_seconds > 0, "round_seconds must be positive");
        ensure!(self.tick_ms > 0.0, "tick_ms must be positive, got {}", self.tick_ms);
        for (name, rule) in [("cell_size", &self.cell_size), ("target_size", &self.target_size)] {
            ensure!(rule.divisor > 0.0, "{}.divisor must be positive", name);
            ensure!(
                rule.min > 0.0 && rule.min <= rule.max,
                "{} needs 0 < min <= max, got {}..{}",
                name,
                rule.min,
                rule.max
            );
        }
        for (name, range) in [
            ("dwell_ms", &self.dwell_ms),
            ("spawn_interval_ms", &self.spawn_interval_ms),
        ] {
            ensure!(
                range.min > 0.0 && range.min <= range.max,
                "{} needs 0 < min <= max, got {}..{}",
                name,
                range.min,
                range.max
            );
        }
        ensure!(self.hit_radius_factor > 0.0, "hit_radius_factor must be positive");
        ensure!(
            self.first_spawn_delay_ms >= 0.0 && self.resume_spawn_delay_ms >= 0.0,
            "spawn delays cannot be negative"
        );
        ensure!(
            self.music_delay_ms >= 0.0,
            "music_delay_ms cannot be negative, got {}",
            self.music_delay_ms
        );
        ensure!(
            (0.0..=1.0).contains(&self.volume),
            "volume must be within 0..=1, got {}",
            self.volume
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn defaults_are_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn size_rule_clamps_both_ends() {
        let rule = SizeRule::new(12.0, 40.0, 80.0);
        assert_relative_eq!(rule.resolve(700.0, 400.0), 40.0);
        assert_relative_eq!(rule.resolve(1200.0, 720.0), 60.0);
        assert_relative_eq!(rule.resolve(2000.0, 2000.0), 80.0);
    }

    #[test]
    fn samples_stay_inside_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let range = MsRange::new(2000.0, 4000.0);
        for _ in 0..500 {
            let value = range.sample(&mut rng);
            assert!((2000.0..4000.0).contains(&value), "{} out of range", value);
        }
    }

    #[test]
    fn degenerate_range_is_fixed() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_relative_eq!(MsRange::new(750.0, 750.0).sample(&mut rng), 750.0);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: GameConfig =
            serde_json::from_str(r#"{ "round_seconds": 30, "dwell_ms": { "min": 1000, "max": 1500 } }"#)
                .unwrap();
        assert_eq!(config.round_seconds, 30);
        assert_relative_eq!(config.dwell_ms.min, 1000.0);
        assert_eq!(config.points_per_hit, 10);
        assert_eq!(config.max_cells, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn inverted_range_is_rejected() {
        let config = GameConfig {
            spawn_interval_ms: MsRange::new(900.0, 100.0),
            ..GameConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("spawn_interval_ms"));
    }

    #[test]
    fn zero_length_round_is_rejected() {
        let config = GameConfig {
            round_seconds: 0,
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn music_can_be_switched_off_from_json() {
        let config: GameConfig = serde_json::from_str(r#"{ "music": false }"#).unwrap();
        assert!(!config.music);
        assert_relative_eq!(config.music_delay_ms, 2000.0);

        let late = GameConfig {
            music_delay_ms: -1.0,
            ..GameConfig::default()
        };
        assert!(late.validate().unwrap_err().to_string().contains("music_delay_ms"));
    }
}
