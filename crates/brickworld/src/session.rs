//! Level-to-level game flow on top of a [`Simulation`].

use std::collections::HashMap;
use std::path::PathBuf;

use glam::Vec2;

use crate::api::error::{Error, Result};
use crate::api::types::GameEvent;
use crate::components::player::Player;
use crate::config::{GameConfig, END_GOAL};
use crate::core::world::World;
use crate::level::builder::WorldBuilder;
use crate::level::grid::load_world;
use crate::systems::gameplay::register_default_handlers;
use crate::systems::stepper::Simulation;

/// Where level text comes from.
pub trait LevelSource {
    fn level_text(&self, name: &str) -> Result<String>;
}

/// Levels stored as files in one directory, named by their file name.
#[derive(Debug, Clone)]
pub struct DirLevels {
    root: PathBuf,
}

impl DirLevels {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl LevelSource for DirLevels {
    fn level_text(&self, name: &str) -> Result<String> {
        Ok(std::fs::read_to_string(self.root.join(name))?)
    }
}

impl LevelSource for HashMap<String, String> {
    fn level_text(&self, name: &str) -> Result<String> {
        self.get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownLevel(name.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Playing,
    /// The player died; [`GameSession::restart`] reloads the level.
    GameOver,
    /// The flag of the last level was reached.
    Finished,
}

/// Health and score the player enters a level with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelRecord {
    pub health: f32,
    pub score: i64,
}

/// One play-through: the current level's simulation plus the player's
/// progress across levels.
pub struct GameSession<S: LevelSource> {
    config: GameConfig,
    levels: S,
    builder: WorldBuilder,
    simulation: Simulation,
    current: String,
    records: HashMap<String, LevelRecord>,
    state: SessionState,
    events: Vec<GameEvent>,
}

impl<S: LevelSource> GameSession<S> {
    /// Validate the config and load its start level.
    pub fn new(config: GameConfig, levels: S) -> Result<Self> {
        config.validate()?;
        let gravity = Vec2::new(0.0, config.world.gravity);
        let builder = WorldBuilder::standard(config.world.block_size, gravity);
        let empty = World::new(Vec2::ZERO, config.world.block_size, gravity);
        let simulation = Simulation::new(empty, config.world.fixed_dt);
        let entry = LevelRecord {
            health: config.player.health,
            score: 0,
        };
        let records = config
            .levels
            .keys()
            .map(|name| (name.clone(), entry))
            .collect();

        let mut session = Self {
            config,
            levels,
            builder,
            simulation,
            current: String::new(),
            records,
            state: SessionState::Playing,
            events: Vec::new(),
        };
        let start = session.config.world.start.clone();
        session.reset_world(&start)?;
        Ok(session)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn current_level(&self) -> &str {
        &self.current
    }

    pub fn record(&self, level: &str) -> Option<LevelRecord> {
        self.records.get(level).copied()
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn simulation_mut(&mut self) -> &mut Simulation {
        &mut self.simulation
    }

    pub fn world(&self) -> &World {
        self.simulation.world()
    }

    pub fn world_mut(&mut self) -> &mut World {
        self.simulation.world_mut()
    }

    pub fn player(&self) -> Option<&Player> {
        self.world().player()
    }

    /// Load `level` and move the player into it.
    ///
    /// Loading the start level restores full health and a zero score.
    /// Reloading the current level restores the health and score the player
    /// entered it with. Any other level keeps the player as is. Jumping,
    /// invincibility and the flag bonus never carry over.
    pub fn reset_world(&mut self, level: &str) -> Result<()> {
        self.config.level(level)?;
        let text = self.levels.level_text(level)?;
        let built = load_world(&mut self.builder, &text);
        self.builder.clear();
        let mut world = built?;

        let mut player = match self.simulation.world_mut().take_player() {
            Some(player) => player,
            None => self.new_player(),
        };
        player.set_bonus_health(false);
        player.set_jumping(false);
        player.set_invincible(false);
        if level == self.config.world.start {
            player.change_health(player.max_health());
            player.change_score(-player.score());
        } else if level == self.current {
            if let Some(record) = self.records.get(level) {
                player.change_health(record.health - player.health());
                player.change_score(record.score - player.score());
            }
        }

        let spawn = &self.config.player;
        world.add_player(player, Vec2::new(spawn.x, spawn.y), spawn.mass);
        world.add_boundary_walls();
        register_default_handlers(&mut world);
        self.simulation.replace_world(world);

        log::info!("entered level {level:?}");
        self.current = level.to_string();
        self.state = SessionState::Playing;
        Ok(())
    }

    /// Reload the current level from its record.
    pub fn restart(&mut self) -> Result<()> {
        let level = self.current.clone();
        self.reset_world(&level)
    }

    /// Run one fixed tick and react to its events. Does nothing unless playing.
    pub fn step(&mut self) -> Result<bool> {
        if self.state != SessionState::Playing || !self.simulation.step() {
            return Ok(false);
        }
        self.process_events()?;
        Ok(true)
    }

    /// Feed frame time. Returns the number of ticks run.
    pub fn advance_frame(&mut self, frame_dt: f32) -> Result<u32> {
        if self.state != SessionState::Playing {
            return Ok(0);
        }
        let ticks = self.simulation.advance_frame(frame_dt);
        self.process_events()?;
        Ok(ticks)
    }

    /// Events seen since the last drain, including the ones the session acted on.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pause(&mut self) {
        self.simulation.pause();
    }

    pub fn resume(&mut self) {
        self.simulation.resume();
    }

    pub fn toggle_pause(&mut self) {
        self.simulation.toggle_pause();
    }

    /// Walk left (`direction < 0`) or right (`direction > 0`) at the player's
    /// max velocity, or stop for zero. The vertical velocity is kept.
    pub fn move_horizontal(&mut self, direction: f32) {
        let world = self.simulation.world_mut();
        let (Some(id), Some(player)) = (world.player_id(), world.player()) else {
            return;
        };
        let sign = if direction > 0.0 {
            1.0
        } else if direction < 0.0 {
            -1.0
        } else {
            0.0
        };
        let speed = player.max_velocity() * sign;
        let vy = world.velocity(id).map_or(0.0, |v| v.y);
        world.set_velocity(id, Vec2::new(speed, vy));
    }

    /// Jump if the player is standing on something. Returns whether it jumped.
    pub fn jump(&mut self) -> bool {
        let world = self.simulation.world_mut();
        let Some(id) = world.player_id() else {
            return false;
        };
        let Some(player) = world.player_mut() else {
            return false;
        };
        if !player.is_jumping() {
            return false;
        }
        player.set_jumping(false);
        let vy = -2.0 * player.max_velocity();
        world.set_velocity(id, Vec2::new(0.0, vy));
        true
    }

    /// Enter the current level's tunnel if the player stands on one.
    /// Returns whether the level changed.
    pub fn duck(&mut self) -> Result<bool> {
        if !self.player().is_some_and(|p| p.on_tunnel()) {
            return Ok(false);
        }
        let Some(tunnel) = self.config.level(&self.current)?.tunnel.clone() else {
            log::warn!("level {:?} has no tunnel configured", self.current);
            return Ok(false);
        };
        self.enter(&tunnel)?;
        Ok(true)
    }

    /// Remember how the player arrives at `level`, then load it.
    fn enter(&mut self, level: &str) -> Result<()> {
        let record = self.player().map(|player| LevelRecord {
            health: player.health(),
            score: player.score(),
        });
        if let Some(record) = record {
            self.records.insert(level.to_string(), record);
        }
        self.reset_world(level)
    }

    fn process_events(&mut self) -> Result<()> {
        let events = self.simulation.drain_events();
        let mut died = false;
        let mut flag = false;
        for event in &events {
            match event {
                GameEvent::PlayerDied => died = true,
                GameEvent::FlagReached => flag = true,
                _ => {}
            }
        }
        self.events.extend(events);

        if died {
            log::info!("game over on level {:?}", self.current);
            self.state = SessionState::GameOver;
        } else if flag {
            let goal = self.config.level(&self.current)?.goal.clone();
            if goal == END_GOAL {
                log::info!("finished the game on level {:?}", self.current);
                self.state = SessionState::Finished;
            } else {
                self.enter(&goal)?;
            }
        }
        Ok(())
    }

    fn new_player(&self) -> Player {
        let config = &self.config.player;
        Player::new(config.character.clone(), config.health).with_max_velocity(config.max_velocity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::Category;

    fn config() -> GameConfig {
        GameConfig::from_json(
            r#"{
                "world": { "start": "one", "gravity": 0 },
                "player": { "x": 24, "y": 8, "health": 5 },
                "levels": {
                    "one": { "goal": "two", "tunnel": "bonus" },
                    "two": { "goal": "END" },
                    "bonus": { "goal": "two" }
                }
            }"#,
        )
        .unwrap()
    }

    fn levels() -> HashMap<String, String> {
        [("one", "#####\n"), ("two", "##\n"), ("bonus", "#\n")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn starts_on_the_start_level_with_walls_and_player() {
        let session = GameSession::new(config(), levels()).unwrap();
        assert_eq!(session.current_level(), "one");
        assert_eq!(session.state(), SessionState::Playing);
        let world = session.world();
        let walls = world.entities().filter(|e| e.category() == Category::Wall).count();
        assert_eq!(walls, 4);
        let id = world.player_id().unwrap();
        assert_eq!(world.position(id).unwrap(), Vec2::new(24.0, 8.0));
        assert_eq!(session.player().unwrap().health(), 5.0);
    }

    #[test]
    fn missing_level_text_fails_construction() {
        let mut levels = levels();
        levels.remove("one");
        assert!(matches!(
            GameSession::new(config(), levels),
            Err(Error::UnknownLevel(_))
        ));
    }

    #[test]
    fn jump_needs_ground() {
        let mut session = GameSession::new(config(), levels()).unwrap();
        assert!(!session.jump());
        session.world_mut().player_mut().unwrap().set_jumping(true);
        assert!(session.jump());
        let id = session.world().player_id().unwrap();
        assert_eq!(session.world().velocity(id), Some(Vec2::new(0.0, -200.0)));
        assert!(!session.jump());
    }

    #[test]
    fn move_keeps_vertical_velocity() {
        let mut session = GameSession::new(config(), levels()).unwrap();
        let id = session.world().player_id().unwrap();
        session.world_mut().set_velocity(id, Vec2::new(0.0, 40.0));
        session.move_horizontal(-1.0);
        assert_eq!(session.world().velocity(id), Some(Vec2::new(-100.0, 40.0)));
    }

    #[test]
    fn zero_direction_stops_the_player() {
        let mut session = GameSession::new(config(), levels()).unwrap();
        let id = session.world().player_id().unwrap();
        session.move_horizontal(1.0);
        assert_eq!(session.world().velocity(id).unwrap().x, 100.0);
        session.move_horizontal(0.0);
        assert_eq!(session.world().velocity(id).unwrap().x, 0.0);
        session.move_horizontal(f32::NAN);
        assert_eq!(session.world().velocity(id).unwrap().x, 0.0);
    }

    #[test]
    fn duck_enters_the_tunnel_level_and_records_entry() {
        let mut session = GameSession::new(config(), levels()).unwrap();
        assert!(!session.duck().unwrap());

        let player = session.world_mut().player_mut().unwrap();
        player.change_score(7);
        player.change_health(-2.0);
        player.set_on_tunnel(true);
        assert!(session.duck().unwrap());
        assert_eq!(session.current_level(), "bonus");
        assert_eq!(
            session.record("bonus"),
            Some(LevelRecord { health: 3.0, score: 7 })
        );

        // Losing progress inside the level and restarting restores the record.
        session.world_mut().player_mut().unwrap().change_score(5);
        session.restart().unwrap();
        let player = session.player().unwrap();
        assert_eq!((player.health(), player.score()), (3.0, 7));
    }

    #[test]
    fn restarting_the_start_level_resets_progress() {
        let mut session = GameSession::new(config(), levels()).unwrap();
        let player = session.world_mut().player_mut().unwrap();
        player.change_score(9);
        player.change_health(-4.0);
        player.set_invincible(true);
        session.restart().unwrap();
        let player = session.player().unwrap();
        assert_eq!((player.health(), player.score()), (5.0, 0));
        assert!(!player.is_invincible());
    }
}
