pub mod config;
pub mod formatting;

pub use config::{
    AudioSpec, BurstSpec, DEFAULT_TICK_RATE, EpisodeConfig, EpisodeMessages, FailurePolicy,
    JitterSpec, MeltdownConfig, ModifierKind, ModifierSpec, ParticleKind, SameTickPolicy,
    SchedulerConfig, ShakeSpec, SoundKind,
};
