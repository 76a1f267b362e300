//! Loading and validation of the meltdown configuration file.
//!
//! The file is TOML with two optional tables, `[scheduler]` and `[episode]`.
//! Missing keys fall back to the stock values, so partial files are fine.

use std::fs;
use std::path::Path;

use meltdown_types::{EpisodeConfig, MeltdownConfig};

use crate::error::ConfigError;

/// Read, parse and validate a config file.
pub fn load_file(path: &Path) -> Result<MeltdownConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: MeltdownConfig = toml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;

    validate(&config)?;
    tracing::debug!(?path, "Loaded config");
    Ok(config)
}

/// Reject configurations the episode cannot run with.
pub fn validate(config: &MeltdownConfig) -> Result<(), ConfigError> {
    validate_episode(&config.episode)
}

fn validate_episode(episode: &EpisodeConfig) -> Result<(), ConfigError> {
    if episode.tick_rate == 0 {
        return Err(ConfigError::Invalid("tick_rate must be positive".into()));
    }
    if episode.pulse_count == 0 {
        return Err(ConfigError::Invalid("pulse_count must be positive".into()));
    }
    // A zero offset targets the activation tick, which has already dispatched
    if episode.pulse_delay_ticks == 0 {
        return Err(ConfigError::Invalid(
            "pulse_delay_ticks must be at least 1".into(),
        ));
    }
    if episode.termination_delay_ticks == 0 {
        return Err(ConfigError::Invalid(
            "termination_delay_ticks must be at least 1".into(),
        ));
    }

    let audio = &episode.audio;
    let jitter = &episode.jitter;
    let shake = &episode.shake;
    // Non-finite bounds make the per-pulse random draws panic
    let finite = [
        ("audio.pitch_min", f64::from(audio.pitch_min)),
        ("audio.pitch_max", f64::from(audio.pitch_max)),
        ("audio.volume", f64::from(audio.volume)),
        ("jitter.horizontal", jitter.horizontal),
        ("jitter.vertical", jitter.vertical),
        ("shake.amplitude", shake.amplitude),
        ("shake.frequency", shake.frequency),
    ];
    if let Some((name, value)) = finite.iter().find(|(_, v)| !v.is_finite()) {
        return Err(ConfigError::Invalid(format!("{name} must be finite, got {value}")));
    }

    if !(audio.pitch_min > 0.0 && audio.pitch_min < audio.pitch_max) {
        return Err(ConfigError::Invalid(format!(
            "audio pitch range [{}, {}) is empty or non-positive",
            audio.pitch_min, audio.pitch_max
        )));
    }
    if audio.volume <= 0.0 {
        return Err(ConfigError::Invalid("audio volume must be positive".into()));
    }

    if jitter.horizontal < 0.0 || jitter.vertical < 0.0 {
        return Err(ConfigError::Invalid(
            "jitter extents must not be negative".into(),
        ));
    }

    if episode.termination_delay_ticks < episode.last_pulse_offset() {
        tracing::warn!(
            termination = episode.termination_delay_ticks,
            last_pulse = episode.last_pulse_offset(),
            "Termination is scheduled before the last pulse"
        );
    }

    Ok(())
}
