//! Recording host for tests.
//!
//! Implements both collaborator traits in memory and records every sink call
//! together with the tick it happened on.

use std::collections::BTreeMap;

use meltdown_types::SoundKind;

use crate::clock::Tick;
use crate::host::{
    EffectSink, Modifier, Orientation, Pose, Position, SessionId, SessionProfile, SessionRegistry,
    VisualBurst,
};
use crate::scheduler::{TaskScheduler, TickReport};

#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Message { text: String, transient: bool },
    Modifier(Modifier),
    Burst(VisualBurst),
    Audio { cue: SoundKind, pitch: f32, volume: f32 },
    Orientation { position: Position, yaw: f32, pitch: f32 },
    Terminate { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub tick: Tick,
    pub session: SessionId,
    pub dispatch: Dispatch,
}

#[derive(Debug, Clone)]
pub struct FakeSession {
    pub name: String,
    pub pose: Pose,
    /// Cleared by `terminate_session`
    pub connected: bool,
    /// Session reports not-live from this tick on
    pub live_until: Option<Tick>,
    /// Host context can be resolved
    pub resolvable: bool,
}

#[derive(Debug, Default)]
pub struct RecordingHost {
    /// Tick the next dispatches are attributed to
    pub tick: Tick,
    pub sessions: BTreeMap<SessionId, FakeSession>,
    pub log: Vec<Recorded>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_session(&mut self, id: u64, name: &str) -> SessionId {
        let session = SessionId(id);
        self.sessions.insert(
            session,
            FakeSession {
                name: name.to_string(),
                pose: Pose {
                    position: Position::new(id as f64 * 10.0, 64.0, -(id as f64)),
                    orientation: Orientation {
                        yaw: 45.0,
                        pitch: 10.0,
                    },
                },
                connected: true,
                live_until: None,
                resolvable: true,
            },
        );
        session
    }

    pub fn session_mut(&mut self, session: SessionId) -> &mut FakeSession {
        self.sessions.get_mut(&session).expect("unknown session")
    }

    pub fn for_session(&self, session: SessionId) -> impl Iterator<Item = &Recorded> + '_ {
        self.log.iter().filter(move |r| r.session == session)
    }

    pub fn at_tick(&self, tick: Tick) -> impl Iterator<Item = &Recorded> + '_ {
        self.log.iter().filter(move |r| r.tick == tick)
    }

    fn record(&mut self, session: SessionId, dispatch: Dispatch) {
        self.log.push(Recorded {
            tick: self.tick,
            session,
            dispatch,
        });
    }

    fn live_at(&self, session: SessionId, tick: Tick) -> bool {
        self.sessions.get(&session).is_some_and(|s| {
            s.connected && s.live_until.is_none_or(|until| tick < until)
        })
    }
}

impl SessionRegistry for RecordingHost {
    fn active_sessions(&self) -> Vec<SessionId> {
        self.sessions
            .keys()
            .copied()
            .filter(|id| self.live_at(*id, self.tick))
            .collect()
    }

    fn profile(&self, session: SessionId) -> Option<SessionProfile> {
        self.sessions
            .get(&session)
            .filter(|s| s.resolvable)
            .map(|s| SessionProfile {
                display_name: s.name.clone(),
            })
    }

    fn pose(&self, session: SessionId) -> Option<Pose> {
        self.sessions.get(&session).map(|s| s.pose)
    }
}

impl EffectSink for RecordingHost {
    fn deliver_message(&mut self, session: SessionId, text: &str, transient: bool) {
        self.record(
            session,
            Dispatch::Message {
                text: text.to_string(),
                transient,
            },
        );
    }

    fn apply_modifier(&mut self, session: SessionId, modifier: Modifier) {
        self.record(session, Dispatch::Modifier(modifier));
    }

    fn emit_visual_burst(&mut self, session: SessionId, burst: &VisualBurst) {
        self.record(session, Dispatch::Burst(burst.clone()));
    }

    fn emit_audio_cue(&mut self, session: SessionId, cue: SoundKind, pitch: f32, volume: f32) {
        self.record(session, Dispatch::Audio { cue, pitch, volume });
    }

    fn update_orientation(&mut self, session: SessionId, position: Position, yaw: f32, pitch: f32) {
        self.record(
            session,
            Dispatch::Orientation {
                position,
                yaw,
                pitch,
            },
        );
    }

    fn terminate_session(&mut self, session: SessionId, reason: &str) {
        self.record(
            session,
            Dispatch::Terminate {
                reason: reason.to_string(),
            },
        );
        if let Some(s) = self.sessions.get_mut(&session) {
            s.connected = false;
        }
    }

    fn is_live(&self, session: SessionId) -> bool {
        self.live_at(session, self.tick)
    }
}

/// Deliver one tick signal, attributing dispatches to the new tick.
pub fn step(scheduler: &mut TaskScheduler<RecordingHost>, host: &mut RecordingHost) -> TickReport {
    host.tick = scheduler.now() + 1;
    scheduler.on_tick(host).expect("tick failed")
}

/// Step until the scheduler clock reads `tick`.
pub fn run_until(scheduler: &mut TaskScheduler<RecordingHost>, host: &mut RecordingHost, tick: Tick) {
    while scheduler.now() < tick {
        step(scheduler, host);
    }
}
