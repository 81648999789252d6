use crate::api::types::GameEvent;
use crate::core::time::FixedTimestep;
use crate::core::world::World;
use crate::systems::collision;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Paused,
}

/// Drives a [`World`] forward one fixed tick at a time.
///
/// A tick runs, in order: the physics step (integration, contact detection
/// and solving of blocking contacts), collision dispatch, every entity's
/// `step`, the removal flush (with its separations) and finally the death
/// check. Handlers therefore see positions from this tick and entity steps
/// see the handlers' changes. A contact a handler marks as blocking is
/// solved from the next tick on.
pub struct Simulation {
    world: World,
    timestep: FixedTimestep,
    state: RunState,
    ticks: u64,
    player_was_dead: bool,
}

impl Simulation {
    pub fn new(world: World, dt: f32) -> Self {
        Self {
            world,
            timestep: FixedTimestep::new(dt),
            state: RunState::Running,
            ticks: 0,
            player_was_dead: false,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Swap in a freshly loaded world, returning the old one.
    pub fn replace_world(&mut self, world: World) -> World {
        self.timestep.reset();
        self.player_was_dead = false;
        std::mem::replace(&mut self.world, world)
    }

    pub fn into_world(self) -> World {
        self.world
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        self.state == RunState::Paused
    }

    pub fn pause(&mut self) {
        self.state = RunState::Paused;
    }

    /// Continue from the last completed tick. Partial frame time from before
    /// the pause is dropped.
    pub fn resume(&mut self) {
        if self.state == RunState::Paused {
            self.timestep.reset();
        }
        self.state = RunState::Running;
    }

    pub fn toggle_pause(&mut self) {
        match self.state {
            RunState::Running => self.pause(),
            RunState::Paused => self.resume(),
        }
    }

    /// Fixed tick length in seconds.
    pub fn dt(&self) -> f32 {
        self.timestep.dt()
    }

    /// Ticks run since creation.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run one tick of the fixed length. Returns `false` (and does nothing) while paused.
    pub fn step(&mut self) -> bool {
        let dt = self.timestep.dt();
        self.advance(dt)
    }

    /// Run one tick of an arbitrary length. Returns `false` (and does nothing) while paused.
    pub fn advance(&mut self, dt: f32) -> bool {
        if self.state == RunState::Paused {
            return false;
        }
        let world = &mut self.world;

        let mut contacts = Vec::new();
        world.physics_mut().step_into(dt, &mut contacts);
        collision::dispatch(world, &contacts);
        world.step_entities(dt);
        world.flush_removals();

        let dead = world.player().is_some_and(|p| p.is_dead());
        if dead && !self.player_was_dead {
            log::info!("player died after {} ticks", self.ticks + 1);
            world.emit(GameEvent::PlayerDied);
        }
        self.player_was_dead = dead;
        self.ticks += 1;
        true
    }

    /// Feed variable frame time; runs as many fixed ticks as it covers (capped).
    /// Returns the number of ticks run.
    pub fn advance_frame(&mut self, frame_dt: f32) -> u32 {
        if self.state == RunState::Paused {
            return 0;
        }
        let steps = self.timestep.accumulate(frame_dt);
        for _ in 0..steps {
            self.step();
        }
        steps
    }

    /// Events produced since the last drain.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.world.drain_events()
    }
}
