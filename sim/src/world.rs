//! In-memory stand-in for a game server.
//!
//! Holds the connected sessions, answers registry queries and logs every
//! effect the core dispatches. Per-session counters feed the run summary.

use hashbrown::HashMap;
use meltdown_core::{
    EffectSink, Modifier, Orientation, Pose, Position, SessionId, SessionProfile, SessionRegistry,
    VisualBurst,
};
use meltdown_types::SoundKind;

/// Dispatch counters for one session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStats {
    pub messages: usize,
    pub modifiers: usize,
    pub bursts: usize,
    pub burst_units: usize,
    pub audio_cues: usize,
    pub orientation_updates: usize,
    pub terminated: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SimSession {
    pub name: String,
    pub pose: Pose,
    pub connected: bool,
    /// Backing host context resolvable
    pub attached: bool,
    pub stats: SessionStats,
}

#[derive(Debug, Default)]
pub struct SimWorld {
    sessions: HashMap<SessionId, SimSession>,
    next_id: u64,
}

impl SimWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `count` sessions spread along the X axis.
    pub fn with_sessions(count: usize) -> Self {
        let mut world = Self::new();
        for i in 0..count {
            world.spawn(&format!("player{}", i + 1));
        }
        world
    }

    pub fn spawn(&mut self, name: &str) -> SessionId {
        self.next_id += 1;
        let id = SessionId(self.next_id);
        let offset = self.sessions.len() as f64 * 8.0;
        self.sessions.insert(
            id,
            SimSession {
                name: name.to_string(),
                pose: Pose {
                    position: Position::new(offset, 64.0, 0.0),
                    orientation: Orientation::default(),
                },
                connected: true,
                attached: true,
                stats: SessionStats::default(),
            },
        );
        tracing::debug!(session = %id, name, "Session joined");
        id
    }

    /// Session ids in join order.
    pub fn session_ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<_> = self.sessions.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn session(&self, id: SessionId) -> Option<&SimSession> {
        self.sessions.get(&id)
    }

    /// Drop the connection without going through the episode.
    pub fn disconnect(&mut self, id: SessionId) {
        if let Some(s) = self.sessions.get_mut(&id) {
            s.connected = false;
            tracing::info!(session = %id, name = %s.name, "Session disconnected");
        }
    }

    /// Detach the host context so activation for this session cannot resolve it.
    pub fn detach(&mut self, id: SessionId) {
        if let Some(s) = self.sessions.get_mut(&id) {
            s.attached = false;
        }
    }

    /// Idle drift so positions read at pulse time differ from activation.
    pub fn drift(&mut self, world_tick: u64) {
        let dz = if world_tick % 40 < 20 { 0.05 } else { -0.05 };
        for s in self.sessions.values_mut().filter(|s| s.connected) {
            s.pose.position.z += dz;
            s.pose.orientation.yaw = (s.pose.orientation.yaw + 0.5) % 360.0;
        }
    }

    fn stats_mut(&mut self, id: SessionId) -> Option<&mut SessionStats> {
        self.sessions.get_mut(&id).map(|s| &mut s.stats)
    }
}

impl SessionRegistry for SimWorld {
    fn active_sessions(&self) -> Vec<SessionId> {
        self.session_ids()
            .into_iter()
            .filter(|id| self.sessions[id].connected)
            .collect()
    }

    fn profile(&self, session: SessionId) -> Option<SessionProfile> {
        self.sessions
            .get(&session)
            .filter(|s| s.attached)
            .map(|s| SessionProfile {
                display_name: s.name.clone(),
            })
    }

    fn pose(&self, session: SessionId) -> Option<Pose> {
        self.sessions.get(&session).map(|s| s.pose)
    }
}

impl EffectSink for SimWorld {
    fn deliver_message(&mut self, session: SessionId, text: &str, transient: bool) {
        tracing::info!(%session, transient, "message: {}", text);
        if let Some(stats) = self.stats_mut(session) {
            stats.messages += 1;
        }
    }

    fn apply_modifier(&mut self, session: SessionId, modifier: Modifier) {
        tracing::info!(
            %session,
            kind = modifier.kind.as_str(),
            intensity = modifier.intensity,
            duration_ticks = modifier.duration_ticks,
            "modifier applied"
        );
        if let Some(stats) = self.stats_mut(session) {
            stats.modifiers += 1;
        }
    }

    fn emit_visual_burst(&mut self, session: SessionId, burst: &VisualBurst) {
        tracing::trace!(
            %session,
            kind = burst.kind.as_str(),
            units = burst.count(),
            x = burst.origin.x,
            y = burst.origin.y,
            z = burst.origin.z,
            "visual burst"
        );
        if let Some(stats) = self.stats_mut(session) {
            stats.bursts += 1;
            stats.burst_units += burst.count();
        }
    }

    fn emit_audio_cue(&mut self, session: SessionId, cue: SoundKind, pitch: f32, volume: f32) {
        tracing::trace!(%session, cue = cue.as_str(), pitch, volume, "audio cue");
        if let Some(stats) = self.stats_mut(session) {
            stats.audio_cues += 1;
        }
    }

    fn update_orientation(&mut self, session: SessionId, position: Position, yaw: f32, pitch: f32) {
        tracing::trace!(%session, yaw, pitch, "orientation overwrite");
        if let Some(s) = self.sessions.get_mut(&session) {
            // Absolute overwrite: the client view snaps to exactly this
            s.pose.position = position;
            s.pose.orientation = Orientation { yaw, pitch };
            s.stats.orientation_updates += 1;
        }
    }

    fn terminate_session(&mut self, session: SessionId, reason: &str) {
        if let Some(s) = self.sessions.get_mut(&session) {
            tracing::info!(%session, name = %s.name, reason, "Session terminated");
            s.connected = false;
            s.stats.terminated = Some(reason.to_string());
        }
    }

    fn is_live(&self, session: SessionId) -> bool {
        self.sessions.get(&session).is_some_and(|s| s.connected)
    }
}
