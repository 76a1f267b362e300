//! Configuration types for the scheduler and the meltdown episode.
//!
//! Everything here is plain data. Loading from disk and validation live in
//! `meltdown-core`; this crate only describes the shape of the TOML file and
//! its defaults. The defaults reproduce the stock episode exactly, so an empty
//! file (or no file at all) behaves like the built-in item.

use serde::{Deserialize, Serialize};

/// Nominal rate of the host's tick signal. Informational only.
pub const DEFAULT_TICK_RATE: u32 = 20;

/// Root of the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeltdownConfig {
    pub scheduler: SchedulerConfig,
    pub episode: EpisodeConfig,
}

// ═══════════════════════════════════════════════════════════════════════════
// Scheduler
// ═══════════════════════════════════════════════════════════════════════════

/// What happens to a task whose target tick has already been dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SameTickPolicy {
    /// The task is never dispatched (observed behavior of the stock scheduler)
    #[default]
    Drop,
    /// Zero-delay tasks scheduled during dispatch run after the current bucket
    Defer,
}

/// How a failing task affects the rest of its bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// First failure aborts the bucket; the remaining tasks are discarded
    #[default]
    FailFast,
    /// Failures are logged and counted; remaining tasks still run
    Isolate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub same_tick: SameTickPolicy,
    pub on_failure: FailurePolicy,
}

// ═══════════════════════════════════════════════════════════════════════════
// Episode building blocks
// ═══════════════════════════════════════════════════════════════════════════

/// Status modifier kinds the episode applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModifierKind {
    Toxicity,
    VisualImpairment,
}

impl ModifierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Toxicity => "toxicity",
            Self::VisualImpairment => "visual-impairment",
        }
    }
}

/// Visual burst categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticleKind {
    Explosion,
    Flame,
    Smoke,
}

impl ParticleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Explosion => "explosion",
            Self::Flame => "flame",
            Self::Smoke => "smoke",
        }
    }
}

/// Audio cue categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundKind {
    Explosion,
    Thunder,
}

impl SoundKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Explosion => "explosion",
            Self::Thunder => "thunder",
        }
    }
}

/// A timed status modifier (kind, intensity, duration).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierSpec {
    pub kind: ModifierKind,
    #[serde(default)]
    pub intensity: u8,
    pub duration_ticks: u64,
}

/// One visual burst per pulse: `count` units of `kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurstSpec {
    pub kind: ParticleKind,
    pub count: u32,
}

/// Per-unit spatial jitter around the session's position.
///
/// X and Z are drawn from `[-horizontal, +horizontal]`, Y from `[0, vertical)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JitterSpec {
    pub horizontal: f64,
    pub vertical: f64,
}

impl Default for JitterSpec {
    fn default() -> Self {
        Self {
            horizontal: 2.0,
            vertical: 3.0,
        }
    }
}

/// Audio cues played each pulse with one shared pitch in `[pitch_min, pitch_max)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSpec {
    pub cues: Vec<SoundKind>,
    pub pitch_min: f32,
    pub pitch_max: f32,
    pub volume: f32,
}

impl Default for AudioSpec {
    fn default() -> Self {
        Self {
            cues: vec![SoundKind::Explosion, SoundKind::Thunder],
            pitch_min: 0.6,
            pitch_max: 1.0,
            volume: 2.0,
        }
    }
}

/// Orientation shake: `yaw = amplitude * cos(frequency * t)`,
/// `pitch = amplitude * sin(frequency * t)`, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShakeSpec {
    pub amplitude: f64,
    pub frequency: f64,
}

impl Default for ShakeSpec {
    fn default() -> Self {
        Self {
            amplitude: 8.0,
            frequency: 0.4,
        }
    }
}

/// Texts delivered during an episode.
///
/// `bystander_notice` may contain `{name}`, replaced by the activating
/// session's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeMessages {
    /// Transient (action bar) message to the activating session
    pub activator_transient: String,
    /// Persistent (chat) message to the activating session
    pub activator_persistent: String,
    pub bystander_notice: String,
    pub bystander_followup: String,
    /// Broadcast to everyone else when the episode terminates
    pub recovery: String,
    pub disconnect_reason: String,
}

impl Default for EpisodeMessages {
    fn default() -> Self {
        Self {
            activator_transient: "You ate the server!".to_string(),
            activator_persistent: "The server has crashed...".to_string(),
            bystander_notice: "Player {name} ate the server!".to_string(),
            bystander_followup: "The server has crashed!".to_string(),
            recovery: "The server is back to normal.".to_string(),
            disconnect_reason: "You ate the server! Connection closed.".to_string(),
        }
    }
}

impl EpisodeMessages {
    pub fn bystander_notice_for(&self, name: &str) -> String {
        self.bystander_notice.replace("{name}", name)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Episode
// ═══════════════════════════════════════════════════════════════════════════

/// Full description of one activation episode.
///
/// All offsets are relative to the activation tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeConfig {
    /// Nominal ticks per second of the host signal (display only)
    pub tick_rate: u32,

    // ─── Immediate burst ────────────────────────────────────────────────────
    pub activator_modifiers: Vec<ModifierSpec>,
    pub bystander_modifier: ModifierSpec,

    // ─── Pulse sequence ─────────────────────────────────────────────────────
    /// Offset of the first pulse
    pub pulse_delay_ticks: u64,
    /// Number of pulses, one per tick
    pub pulse_count: u32,
    pub bursts: Vec<BurstSpec>,
    pub jitter: JitterSpec,
    pub audio: AudioSpec,
    pub shake: ShakeSpec,

    // ─── Termination ────────────────────────────────────────────────────────
    /// Offset of the termination action. Overlaps the final pulse by default.
    pub termination_delay_ticks: u64,

    pub messages: EpisodeMessages,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            activator_modifiers: vec![
                ModifierSpec {
                    kind: ModifierKind::Toxicity,
                    intensity: 0,
                    duration_ticks: 160,
                },
                ModifierSpec {
                    kind: ModifierKind::VisualImpairment,
                    intensity: 0,
                    duration_ticks: 200,
                },
            ],
            bystander_modifier: ModifierSpec {
                kind: ModifierKind::VisualImpairment,
                intensity: 0,
                duration_ticks: 100,
            },
            pulse_delay_ticks: 1,
            pulse_count: 100,
            bursts: vec![
                BurstSpec {
                    kind: ParticleKind::Explosion,
                    count: 60,
                },
                BurstSpec {
                    kind: ParticleKind::Flame,
                    count: 80,
                },
                BurstSpec {
                    kind: ParticleKind::Smoke,
                    count: 40,
                },
            ],
            jitter: JitterSpec::default(),
            audio: AudioSpec::default(),
            shake: ShakeSpec::default(),
            termination_delay_ticks: 100,
            messages: EpisodeMessages::default(),
        }
    }
}

impl EpisodeConfig {
    /// Offset of the last pulse relative to activation.
    pub fn last_pulse_offset(&self) -> u64 {
        self.pulse_delay_ticks + u64::from(self.pulse_count.saturating_sub(1))
    }
}
