//! Per-player tick scheduling
//!
//! The engine asks a [`TickScheduler`] for one repeating task per running
//! board and keeps the returned [`TickHandle`] until the board is paused,
//! defeated, disconnected or changes speed. Production uses
//! [`TokioScheduler`]; tests use [`ManualScheduler`] and fire ticks by hand.
//!
//! Every task carries the generation of the handle that created it. A tick
//! already in flight when its handle is cancelled still reaches the target,
//! which compares generations and drops it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::ws::protocol::PlayerId;

/// Shortest period a tokio task will run at
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Something that advances one player's board
pub trait TickTarget: Send + Sync {
    /// `generation` identifies the task that fired
    fn tick(&self, player_id: &PlayerId, generation: u64);
}

/// Creates cancelable repeating tick tasks
pub trait TickScheduler: Send + Sync {
    /// Tick `target` for `player_id` every `every`, first tick one interval from now
    fn schedule(
        &self,
        player_id: PlayerId,
        every: Duration,
        target: Weak<dyn TickTarget>,
    ) -> TickHandle;
}

/// Cancels exactly one scheduled task
pub struct TickHandle {
    generation: u64,
    cancel: Box<dyn FnOnce() + Send>,
}

impl TickHandle {
    pub fn new(generation: u64, cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            generation,
            cancel: Box::new(cancel),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel(self) {
        (self.cancel)();
    }
}

impl std::fmt::Debug for TickHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickHandle")
            .field("generation", &self.generation)
            .finish()
    }
}

/// One tokio task per player
#[derive(Debug, Default)]
pub struct TokioScheduler {
    generation: AtomicU64,
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TickScheduler for TokioScheduler {
    fn schedule(
        &self,
        player_id: PlayerId,
        every: Duration,
        target: Weak<dyn TickTarget>,
    ) -> TickHandle {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        if every < MIN_PERIOD {
            warn!(player_id = %player_id, ?every, "Tick interval too short, clamping");
        }
        let every = every.max(MIN_PERIOD);

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                match target.upgrade() {
                    Some(target) => target.tick(&player_id, generation),
                    None => {
                        debug!(player_id = %player_id, "Tick target dropped, stopping loop");
                        break;
                    }
                }
            }
        });

        TickHandle::new(generation, move || task.abort())
    }
}

struct ManualEntry {
    generation: u64,
    every: Duration,
    target: Weak<dyn TickTarget>,
}

/// Deterministic scheduler: records schedules, ticks only when fired
#[derive(Clone, Default)]
pub struct ManualScheduler {
    active: Arc<Mutex<HashMap<PlayerId, ManualEntry>>>,
    generation: Arc<AtomicU64>,
    scheduled_total: Arc<AtomicU64>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_scheduled(&self, player_id: &PlayerId) -> bool {
        self.active.lock().contains_key(player_id)
    }

    /// Interval of the live task for a player
    pub fn interval_for(&self, player_id: &PlayerId) -> Option<Duration> {
        self.active.lock().get(player_id).map(|e| e.every)
    }

    /// Number of `schedule` calls so far
    pub fn scheduled_total(&self) -> u64 {
        self.scheduled_total.load(Ordering::Relaxed)
    }

    /// Run one tick for a player if a task is live; returns whether it ran
    pub fn fire(&self, player_id: &PlayerId) -> bool {
        let live = self
            .active
            .lock()
            .get(player_id)
            .and_then(|e| e.target.upgrade().map(|target| (target, e.generation)));

        match live {
            Some((target, generation)) => {
                target.tick(player_id, generation);
                true
            }
            None => false,
        }
    }
}

impl TickScheduler for ManualScheduler {
    fn schedule(
        &self,
        player_id: PlayerId,
        every: Duration,
        target: Weak<dyn TickTarget>,
    ) -> TickHandle {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        self.scheduled_total.fetch_add(1, Ordering::Relaxed);
        self.active.lock().insert(
            player_id.clone(),
            ManualEntry {
                generation,
                every,
                target,
            },
        );

        let active = self.active.clone();
        TickHandle::new(generation, move || {
            let mut active = active.lock();
            if active
                .get(&player_id)
                .is_some_and(|e| e.generation == generation)
            {
                active.remove(&player_id);
            }
        })
    }
}
