//! Collaborator interfaces the core acts through.
//!
//! The core never owns a session. It refers to sessions by [`SessionId`],
//! asks a [`SessionRegistry`] who is online and where they are, and sends
//! everything observable through an [`EffectSink`]. Every sink call is
//! fire-and-forget: nothing here returns a result the core could act on.

use std::fmt;

use meltdown_types::{ModifierKind, ModifierSpec, ParticleKind, SoundKind};

/// Identity of one connected participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Absolute world position.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn offset(&self, by: Offset) -> Self {
        Self {
            x: self.x + by.dx,
            y: self.y + by.dy,
            z: self.z + by.dz,
        }
    }
}

/// Displacement relative to a [`Position`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Offset {
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
}

/// View direction in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Orientation {
    pub yaw: f32,
    pub pitch: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pose {
    pub position: Position,
    pub orientation: Orientation,
}

/// Host context backing a session, as far as the core needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProfile {
    pub display_name: String,
}

/// A timed status alteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Modifier {
    pub kind: ModifierKind,
    pub intensity: u8,
    pub duration_ticks: u64,
}

impl From<&ModifierSpec> for Modifier {
    fn from(spec: &ModifierSpec) -> Self {
        Self {
            kind: spec.kind,
            intensity: spec.intensity,
            duration_ticks: spec.duration_ticks,
        }
    }
}

/// One burst of visual units around `origin`, one offset per unit.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualBurst {
    pub kind: ParticleKind,
    /// Session position at dispatch time
    pub origin: Position,
    pub offsets: Vec<Offset>,
}

impl VisualBurst {
    pub fn count(&self) -> usize {
        self.offsets.len()
    }

    /// Absolute position of every unit.
    pub fn points(&self) -> impl Iterator<Item = Position> + '_ {
        self.offsets.iter().map(|o| self.origin.offset(*o))
    }
}

/// Read-only view of the connected sessions.
pub trait SessionRegistry {
    /// Everyone online right now. Queried fresh on every call.
    fn active_sessions(&self) -> Vec<SessionId>;

    /// Resolve the host context for `session`. `None` means it cannot be
    /// obtained (the session is not backed by a live host).
    fn profile(&self, session: SessionId) -> Option<SessionProfile>;

    /// Current position and orientation.
    fn pose(&self, session: SessionId) -> Option<Pose>;
}

/// Outbound effects. Implementations must not block.
pub trait EffectSink {
    fn deliver_message(&mut self, session: SessionId, text: &str, transient: bool);

    fn apply_modifier(&mut self, session: SessionId, modifier: Modifier);

    fn emit_visual_burst(&mut self, session: SessionId, burst: &VisualBurst);

    fn emit_audio_cue(&mut self, session: SessionId, cue: SoundKind, pitch: f32, volume: f32);

    /// Absolute overwrite of position and view direction (not a teleport,
    /// not relative deltas).
    fn update_orientation(&mut self, session: SessionId, position: Position, yaw: f32, pitch: f32);

    fn terminate_session(&mut self, session: SessionId, reason: &str);

    fn is_live(&self, session: SessionId) -> bool;
}

/// Everything an episode needs from its host.
pub trait EpisodeHost: SessionRegistry + EffectSink {}

impl<T: SessionRegistry + EffectSink> EpisodeHost for T {}
