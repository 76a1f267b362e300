//! Tick driver: the simulator's tick source.
//!
//! The world ticks from the start. The scheduler only starts receiving ticks
//! once its first `schedule` call connects the source, so its clock reads 0
//! at the moment of the first activation no matter how long the world has
//! been running.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use meltdown_core::{
    Episode, EpisodeError, EpisodeTicket, SchedulerError, SessionId, TaskScheduler, Tick,
    TickSource,
};
use meltdown_types::{MeltdownConfig, SchedulerConfig};
use meltdown_types::formatting::format_timeline;

use crate::world::SimWorld;

/// Flips a shared flag when the scheduler connects.
#[derive(Debug)]
pub struct HostTickSource {
    connected: Rc<Cell<bool>>,
}

impl TickSource for HostTickSource {
    fn connect(&mut self) {
        self.connected.set(true);
        tracing::info!("Scheduler registered with the server tick");
    }
}

/// What the run should do and when.
#[derive(Debug, Clone)]
pub struct Plan {
    pub sessions: usize,
    /// Index into the session list of the session that consumes the item
    pub activator: usize,
    /// World tick of the activation
    pub activate_at: u64,
    /// Scheduler tick at which the activator drops out by itself
    pub disconnect_at: Option<Tick>,
    /// Activator's host context cannot be resolved
    pub detached: bool,
    pub max_ticks: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Running,
    /// Termination ran, or activation was refused
    Finished,
    /// Ran out of world ticks
    Exhausted,
}

pub struct Driver {
    scheduler: TaskScheduler<SimWorld>,
    world: SimWorld,
    episode: Episode,
    plan: Plan,
    connected: Rc<Cell<bool>>,
    activator: Option<SessionId>,
    world_tick: u64,
    ticket: Option<EpisodeTicket>,
    refused: bool,
}

impl Driver {
    pub fn new(config: MeltdownConfig, plan: Plan) -> Self {
        let connected = Rc::new(Cell::new(false));
        let source = HostTickSource {
            connected: Rc::clone(&connected),
        };
        let mut world = SimWorld::with_sessions(plan.sessions);
        let activator = world.session_ids().get(plan.activator).copied();
        if plan.detached
            && let Some(id) = activator
        {
            world.detach(id);
        }

        Self {
            scheduler: TaskScheduler::new(source, config.scheduler),
            world,
            episode: Episode::new(config.episode),
            plan,
            connected,
            activator,
            world_tick: 0,
            ticket: None,
            refused: false,
        }
    }

    pub fn world(&self) -> &SimWorld {
        &self.world
    }

    pub fn ticket(&self) -> Option<&EpisodeTicket> {
        self.ticket.as_ref()
    }

    pub fn world_tick(&self) -> u64 {
        self.world_tick
    }

    pub fn scheduler_tick(&self) -> Tick {
        self.scheduler.now()
    }

    pub fn dropped_tasks(&self) -> u64 {
        self.scheduler.dropped_tasks()
    }

    pub fn tick_rate(&self) -> u32 {
        self.episode.config().tick_rate
    }

    pub fn scheduler_config(&self) -> &SchedulerConfig {
        self.scheduler.config()
    }

    /// Advance the world by one tick.
    pub fn step(&mut self) -> Result<Progress, SchedulerError> {
        if self.world_tick >= self.plan.max_ticks {
            return Ok(Progress::Exhausted);
        }
        self.world_tick += 1;
        self.world.drift(self.world_tick);

        if self.world_tick == self.plan.activate_at {
            self.activate();
        }

        if self.connected.get() {
            if let (Some(at), Some(id)) = (self.plan.disconnect_at, self.activator)
                && self.scheduler.now() + 1 == at
            {
                self.world.disconnect(id);
            }

            let report = self.scheduler.on_tick(&mut self.world)?;
            if report.executed > 0 {
                tracing::debug!(
                    at = %format_timeline(report.tick, self.tick_rate()),
                    executed = report.executed,
                    "Dispatched"
                );
            }
        }

        Ok(self.progress())
    }

    fn activate(&mut self) {
        let Some(session) = self.activator else {
            tracing::warn!(index = self.plan.activator, "No session at activator index");
            self.refused = true;
            return;
        };

        match self
            .episode
            .activate(&mut self.scheduler, &mut self.world, session)
        {
            Ok(ticket) => {
                tracing::info!(
                    %session,
                    world_tick = self.world_tick,
                    terminates_at = %format_timeline(ticket.terminates_at, self.tick_rate()),
                    "Item consumed"
                );
                self.ticket = Some(ticket);
            }
            Err(EpisodeError::UnresolvedHost(session)) => {
                tracing::warn!(%session, "Item consumed without a host context; nothing happens");
                self.refused = true;
            }
        }
    }

    fn progress(&self) -> Progress {
        if self.refused {
            return Progress::Finished;
        }
        match &self.ticket {
            Some(ticket) if self.scheduler.now() >= ticket.terminates_at => Progress::Finished,
            _ if self.world_tick >= self.plan.max_ticks => Progress::Exhausted,
            _ => Progress::Running,
        }
    }

    /// Step as fast as possible until the run ends.
    pub fn run_to_end(&mut self) -> Result<Progress, SchedulerError> {
        loop {
            match self.step()? {
                Progress::Running => continue,
                done => return Ok(done),
            }
        }
    }

    /// Step at the configured tick rate until the run ends.
    pub async fn run_realtime(&mut self) -> Result<Progress, SchedulerError> {
        let period = Duration::from_secs_f64(1.0 / f64::from(self.tick_rate().max(1)));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Burst);

        loop {
            interval.tick().await;
            match self.step()? {
                Progress::Running => continue,
                done => return Ok(done),
            }
        }
    }
}
