//! Meltdown episode
//!
//! One activation (the item being consumed) produces a fixed timeline of
//! effects on the scheduler:
//!
//! ```text
//!  T0          T0+1                              T0+100
//!  │           │                                    │
//!  ├─ messages, modifiers (activator + everyone else)
//!  │           ├─ pulse ─ pulse ─ ... ─ pulse ──────┤  one per tick
//!  │           │                                    ├─ recovery broadcast
//!  │           │                                    └─ terminate activator
//! ```
//!
//! The final pulse and the termination share a tick; the pulse was scheduled
//! first, so it runs first. Offsets come from [`EpisodeConfig`] and default to
//! the stock item.
//!
//! A pulse checks liveness when it runs. A disconnected activator turns the
//! remaining pulses into no-ops, but they still occupy their ticks. The
//! termination runs unconditionally.

pub mod pulse;


use std::sync::Arc;

use meltdown_types::EpisodeConfig;
use meltdown_types::formatting::format_ticks;

use crate::clock::Tick;
use crate::error::EpisodeError;
use crate::host::{EpisodeHost, Modifier, SessionId, VisualBurst};
use crate::scheduler::TaskScheduler;

use pulse::{jitter_offsets, roll_pitch, shake_offset};

/// Timeline of a scheduled episode, in absolute ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeTicket {
    pub session: SessionId,
    pub activated_at: Tick,
    /// `None` when the episode has no pulses
    pub first_pulse: Option<Tick>,
    pub last_pulse: Option<Tick>,
    pub terminates_at: Tick,
}

/// Entry point for activations. Cheap to clone; tasks share its config.
#[derive(Debug, Clone)]
pub struct Episode {
    config: Arc<EpisodeConfig>,
}

impl Episode {
    pub fn new(config: EpisodeConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &EpisodeConfig {
        &self.config
    }

    /// Start an episode for `session`.
    ///
    /// Delivers the immediate burst, then schedules every pulse and the
    /// termination. Fails without side effects when the session's host
    /// context cannot be resolved.
    pub fn activate<H>(
        &self,
        scheduler: &mut TaskScheduler<H>,
        host: &mut H,
        session: SessionId,
    ) -> Result<EpisodeTicket, EpisodeError>
    where
        H: EpisodeHost + 'static,
    {
        let Some(profile) = host.profile(session) else {
            tracing::warn!(%session, "Activation ignored: host context unavailable");
            return Err(EpisodeError::UnresolvedHost(session));
        };

        let cfg = &self.config;
        let now = scheduler.now();

        tracing::info!(
            %session,
            name = %profile.display_name,
            tick = now,
            pulses = cfg.pulse_count,
            terminates_in = %format_ticks(cfg.termination_delay_ticks, cfg.tick_rate),
            "Episode activated"
        );

        // ─── Immediate burst ────────────────────────────────────────────────
        host.deliver_message(session, &cfg.messages.activator_transient, true);
        host.deliver_message(session, &cfg.messages.activator_persistent, false);
        for spec in &cfg.activator_modifiers {
            host.apply_modifier(session, Modifier::from(spec));
        }

        let notice = cfg.messages.bystander_notice_for(&profile.display_name);
        let bystander_modifier = Modifier::from(&cfg.bystander_modifier);
        for other in host.active_sessions() {
            if other == session {
                continue;
            }
            host.deliver_message(other, &notice, false);
            host.apply_modifier(other, bystander_modifier);
            host.deliver_message(other, &cfg.messages.bystander_followup, false);
        }

        // ─── Pulses ─────────────────────────────────────────────────────────
        let mut first_pulse = None;
        let mut last_pulse = None;
        for i in 0..cfg.pulse_count {
            let delay = cfg.pulse_delay_ticks + u64::from(i);
            let config = Arc::clone(&self.config);
            let scheduled = scheduler.schedule(delay, move |scheduler, host: &mut H| {
                run_pulse(&config, scheduler.now(), host, session);
                Ok(())
            });
            if !scheduled.is_dropped() {
                first_pulse.get_or_insert(scheduled.tick());
                last_pulse = Some(scheduled.tick());
            }
        }

        // ─── Termination ────────────────────────────────────────────────────
        let config = Arc::clone(&self.config);
        let terminates_at = scheduler
            .schedule(cfg.termination_delay_ticks, move |scheduler, host: &mut H| {
                terminate(&config, scheduler.now(), host, session);
                Ok(())
            })
            .tick();

        Ok(EpisodeTicket {
            session,
            activated_at: now,
            first_pulse,
            last_pulse,
            terminates_at,
        })
    }
}

/// One pulse of the effect sequence, aimed only at `session`.
fn run_pulse<H: EpisodeHost>(config: &EpisodeConfig, tick: Tick, host: &mut H, session: SessionId) {
    if !host.is_live(session) {
        tracing::trace!(%session, tick, "Pulse skipped: session no longer live");
        return;
    }
    // Position is read now, not at activation
    let Some(pose) = host.pose(session) else {
        tracing::trace!(%session, tick, "Pulse skipped: no pose");
        return;
    };

    let mut rng = rand::thread_rng();

    for burst in &config.bursts {
        let burst = VisualBurst {
            kind: burst.kind,
            origin: pose.position,
            offsets: jitter_offsets(&mut rng, burst.count, &config.jitter),
        };
        host.emit_visual_burst(session, &burst);
    }

    let pitch = roll_pitch(&mut rng, &config.audio);
    for cue in &config.audio.cues {
        host.emit_audio_cue(session, *cue, pitch, config.audio.volume);
    }

    let shaken = shake_offset(tick, &config.shake).apply(pose.orientation);
    host.update_orientation(session, pose.position, shaken.yaw, shaken.pitch);

    tracing::trace!(%session, tick, pitch, "Pulse delivered");
}

fn terminate<H: EpisodeHost>(config: &EpisodeConfig, tick: Tick, host: &mut H, session: SessionId) {
    for other in host.active_sessions() {
        if other != session {
            host.deliver_message(other, &config.messages.recovery, false);
        }
    }
    host.terminate_session(session, &config.messages.disconnect_reason);
    tracing::info!(%session, tick, "Episode terminated session");
}
