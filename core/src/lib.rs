pub mod clock;
pub mod config;
pub mod episode;
pub mod error;
pub mod host;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenience
pub use clock::{Tick, TickClock};
pub use episode::{Episode, EpisodeTicket};
pub use error::{ConfigError, EpisodeError, SchedulerError, TaskError};
pub use host::{
    EffectSink, EpisodeHost, Modifier, Offset, Orientation, Pose, Position, SessionId,
    SessionProfile, SessionRegistry, VisualBurst,
};
pub use scheduler::{ManualTickSource, Scheduled, Task, TaskScheduler, TickReport, TickSource};
