//! Drop-and-merge session
//!
//! Per step: spawner cooldown → engine step → merges → game-over scan →
//! out-of-bounds sweep. Input only moves or releases the held fruit.

use std::collections::BTreeSet;

use glam::Vec2;

use super::body::{BodyKind, BodyTable};
use super::game_over::{Candidate, GameOverDetector};
use super::levels::LevelTable;
use super::merge::resolve_merges;
use super::physics::{BodyId, Material, PhysicsWorld};
use super::spawn::{SpawnController, SpawnPhase};
use super::state::{
    ArcadeGame, GameEvent, GameMode, reproject_bodies, spawn_walls, sweep_out_of_bounds,
};
use crate::tuning::Tuning;

/// One drop-variant game
pub struct DropGame<W: PhysicsWorld> {
    world: W,
    table: BodyTable,
    levels: LevelTable,
    tuning: Tuning,
    material: Material,
    spawner: SpawnController,
    detector: GameOverDetector,
    walls: Vec<BodyId>,
    size: Vec2,
    score: u64,
    game_over: bool,
}

impl<W: PhysicsWorld> DropGame<W> {
    pub fn new(mut world: W, tuning: &Tuning, width: f32, height: f32, seed: u64) -> Self {
        let levels = LevelTable::standard();
        world.clear();
        world.set_gravity(tuning.drop_game.gravity_vec());

        let mut table = BodyTable::new();
        let walls = spawn_walls(
            &mut world,
            &mut table,
            width,
            height,
            tuning.physics.wall_thickness,
        );

        log::info!("Drop game started ({}x{}, seed {})", width, height, seed);
        Self {
            world,
            table,
            levels,
            tuning: tuning.clone(),
            material: tuning.physics.fruit_material(),
            spawner: SpawnController::new(seed, &levels, &tuning.drop_game),
            detector: GameOverDetector::new(&tuning.drop_game),
            walls,
            size: Vec2::new(width, height),
            score: 0,
            game_over: false,
        }
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn levels(&self) -> &LevelTable {
        &self.levels
    }

    pub fn spawner(&self) -> &SpawnController {
        &self.spawner
    }

    pub fn detector(&self) -> &GameOverDetector {
        &self.detector
    }

    /// Held fruit follows the pointer. No-op after game over.
    pub fn on_held_move(&mut self, x: f32) -> bool {
        if self.game_over {
            return false;
        }
        self.spawner
            .move_held(&mut self.world, &self.table, x, self.size.x)
    }

    /// Drop the held fruit at `x`
    pub fn on_held_release(&mut self, x: f32, now_ms: f64) -> Vec<GameEvent> {
        if self.game_over {
            return Vec::new();
        }
        self.spawner
            .release_held(&mut self.world, &mut self.table, x, self.size.x, now_ms)
            .into_iter()
            .collect()
    }

    fn try_spawn(&mut self, events: &mut Vec<GameEvent>) {
        if self.spawner.phase() != SpawnPhase::Ready {
            return;
        }
        match self.spawner.spawn_held(
            &mut self.world,
            &mut self.table,
            &self.levels,
            self.material,
            self.size.x,
            self.score,
            &self.tuning.drop_game,
        ) {
            Ok(Some(event)) => events.push(event),
            Ok(None) => {}
            Err(e) => log::warn!("Could not spawn held fruit: {}", e),
        }
    }

    /// Non-held fruit in the world, minus `skip`
    fn candidates(&self, skip: &BTreeSet<BodyId>) -> Vec<Candidate> {
        self.table
            .iter()
            .filter(|(id, meta)| meta.fruit_level().is_some() && !skip.contains(id))
            .filter_map(|(body, _)| {
                let state = self.world.body(body)?;
                Some(Candidate {
                    body,
                    position: state.position,
                    speed: state.speed(),
                })
            })
            .collect()
    }

    fn end_game(&mut self, events: &mut Vec<GameEvent>) {
        self.game_over = true;
        if let Some(held) = self.spawner.take_held() {
            self.table.despawn(&mut self.world, held);
        }
        self.detector.reset();
        log::info!("Game over with score {}", self.score);
        events.push(GameEvent::GameOver { score: self.score });
    }
}

impl<W: PhysicsWorld> ArcadeGame for DropGame<W> {
    fn mode(&self) -> GameMode {
        GameMode::Drop
    }

    fn step(&mut self, now_ms: f64, dt: f32) -> Vec<GameEvent> {
        if self.game_over {
            return Vec::new();
        }
        let mut events = Vec::new();

        self.spawner.update(now_ms);
        self.try_spawn(&mut events);

        let pairs = self.world.step(dt);
        let merges = resolve_merges(
            &pairs,
            &mut self.world,
            &mut self.table,
            &self.levels,
            self.material,
            &mut self.score,
        );
        // Fruit created by this batch is only scanned from the next step on
        let created: BTreeSet<BodyId> = merges
            .iter()
            .filter_map(|event| match event {
                GameEvent::Merged { created, .. } => Some(*created),
                _ => None,
            })
            .collect();
        events.extend(merges);

        if !self.spawner.is_dropping() {
            let candidates = self.candidates(&created);
            let scan = self.detector.scan(now_ms, &candidates);
            events.extend(
                scan.newly_stuck
                    .into_iter()
                    .map(|body| GameEvent::BodyStuck { body }),
            );
            if scan.game_over {
                self.end_game(&mut events);
            }
        }

        // Only tunneling fruit can get here; drop it silently
        for (id, meta) in sweep_out_of_bounds(
            &mut self.world,
            &mut self.table,
            self.size,
            self.tuning.physics.offscreen_margin,
        ) {
            log::debug!("Swept {} ({:?}) out of bounds", id, meta.kind);
        }

        events
    }

    fn restart(&mut self, _now_ms: f64) -> Vec<GameEvent> {
        self.world.clear();
        self.table.clear();
        self.score = 0;
        self.game_over = false;
        self.detector.reset();
        self.spawner.reset(&self.levels, &self.tuning.drop_game);
        self.walls = spawn_walls(
            &mut self.world,
            &mut self.table,
            self.size.x,
            self.size.y,
            self.tuning.physics.wall_thickness,
        );
        log::info!("Drop game restarted");
        vec![GameEvent::Restarted, GameEvent::ScoreChanged { score: 0 }]
    }

    fn resize(&mut self, width: f32, height: f32) {
        if !(width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite()) {
            return;
        }
        for wall in std::mem::take(&mut self.walls) {
            self.table.despawn(&mut self.world, wall);
        }

        let new_size = Vec2::new(width, height);
        reproject_bodies(&mut self.world, &self.table, self.size, new_size);
        self.size = new_size;
        self.walls = spawn_walls(
            &mut self.world,
            &mut self.table,
            width,
            height,
            self.tuning.physics.wall_thickness,
        );

        // Back onto the spawn line, clamped to the new width
        if let Some(held) = self.spawner.held()
            && let Some(state) = self.world.body(held)
        {
            self.spawner
                .move_held(&mut self.world, &self.table, state.position.x, width);
        }
        log::debug!("Drop game resized to {}x{}", width, height);
    }

    fn pointer_down(&mut self, pos: Vec2, _now_ms: f64) -> Vec<GameEvent> {
        self.on_held_move(pos.x);
        Vec::new()
    }

    fn pointer_move(&mut self, pos: Vec2, _now_ms: f64) -> Vec<GameEvent> {
        self.on_held_move(pos.x);
        Vec::new()
    }

    fn pointer_up(&mut self, pos: Vec2, now_ms: f64) -> Vec<GameEvent> {
        self.on_held_release(pos.x, now_ms)
    }

    fn score(&self) -> u64 {
        self.score
    }

    fn is_game_over(&self) -> bool {
        self.game_over
    }

    fn next_level(&self) -> Option<usize> {
        Some(self.spawner.next_level())
    }

    fn size(&self) -> Vec2 {
        self.size
    }

    fn world(&self) -> &dyn PhysicsWorld {
        &self.world
    }

    fn bodies(&self) -> &BodyTable {
        &self.table
    }

    fn clear(&mut self) {
        self.world.clear();
        self.table.clear();
        self.walls.clear();
        self.spawner.take_held();
        self.detector.reset();
    }
}

impl<W: PhysicsWorld> DropGame<W> {
    /// Number of live fruits, held one included
    pub fn fruit_count(&self) -> usize {
        self.table
            .iter()
            .filter(|(_, meta)| matches!(meta.kind, BodyKind::Fruit { .. }))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::CircleWorld;
    use crate::sim::body::fruit_body;
    use crate::sim::physics::Motion;

    const W: f32 = 400.0;
    const H: f32 = 600.0;

    fn game() -> DropGame<CircleWorld> {
        DropGame::new(CircleWorld::default(), &Tuning::default(), W, H, 42)
    }

    /// Fruit parked at a fixed spot, not moved by gravity
    fn parked_fruit(game: &mut DropGame<CircleWorld>, pos: Vec2, level: usize) -> BodyId {
        let desc = fruit_body(&game.levels, game.material, pos, level, false).unwrap();
        let id = game.table.spawn(&mut game.world, desc);
        game.world.set_motion(id, Motion::Kinematic, false);
        id
    }

    #[test]
    fn test_first_step_spawns_held_fruit() {
        let mut game = game();
        let events = game.step(0.0, SIM_DT);
        let Some(GameEvent::Spawned { body, level, next_level }) = events.first().cloned() else {
            panic!("expected Spawned, got {:?}", events);
        };
        assert!(level < 5 && next_level < 5);
        assert_eq!(game.spawner().held(), Some(body));
        let state = game.world().body(body).unwrap();
        assert_eq!(state.position, Vec2::new(200.0, 50.0));
    }

    #[test]
    fn test_drop_then_cooldown_then_respawn() {
        let mut game = game();
        game.step(0.0, SIM_DT);
        let first = game.spawner().held().unwrap();

        assert!(game.on_held_move(-500.0));
        let radius = game.bodies().get(first).unwrap().render.unwrap().radius;
        assert_eq!(game.world().body(first).unwrap().position.x, radius);

        let events = game.on_held_release(100.0, 10.0);
        assert_eq!(events, vec![GameEvent::Dropped { body: first }]);
        assert!(game.spawner().is_dropping());

        let mut now = 10.0;
        while now < 600.0 {
            now += 1000.0 / 120.0;
            let events = game.step(now, SIM_DT);
            assert!(
                !events.iter().any(|e| matches!(e, GameEvent::Spawned { .. })),
                "spawned during cooldown at {}",
                now
            );
        }
        // The dropped fruit fell
        assert!(game.world().body(first).unwrap().position.y > 100.0);

        let events = game.step(611.0, SIM_DT);
        assert!(matches!(events.first(), Some(GameEvent::Spawned { .. })));
    }

    #[test]
    fn test_equal_fruits_merge_and_score() {
        let mut game = game();
        let levels = game.levels;
        let a = game.table.spawn(
            &mut game.world,
            fruit_body(&levels, game.material, Vec2::new(200.0, 500.0), 0, false).unwrap(),
        );
        let b = game.table.spawn(
            &mut game.world,
            fruit_body(&levels, game.material, Vec2::new(215.0, 500.0), 0, false).unwrap(),
        );

        let events = game.step(0.0, SIM_DT);
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::Merged { consumed, level: 1, .. } if *consumed == [a, b]
        )));
        assert!(events.contains(&GameEvent::ScoreChanged { score: 4 }));
        assert_eq!(game.score(), 4);
    }

    #[test]
    fn test_stuck_fruit_ends_game_once() {
        let mut game = game();
        game.step(0.0, SIM_DT);
        assert!(game.spawner().held().is_some());
        let stuck = parked_fruit(&mut game, Vec2::new(300.0, 75.0), 1);

        let events = game.step(100.0, SIM_DT);
        assert!(events.contains(&GameEvent::BodyStuck { body: stuck }));

        assert!(game.step(1099.0, SIM_DT).is_empty());
        let events = game.step(1101.0, SIM_DT);
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, GameEvent::GameOver { .. }))
                .count(),
            1
        );
        assert!(game.is_game_over());
        // Held fruit removed, the rest stays for display
        assert_eq!(game.spawner().held(), None);
        assert_eq!(game.fruit_count(), 1);

        assert!(game.step(5000.0, SIM_DT).is_empty());
        assert!(!game.on_held_move(10.0));
        assert!(game.on_held_release(10.0, 5000.0).is_empty());
    }

    #[test]
    fn test_merged_fruit_waits_a_step_before_scan() {
        let mut game = game();
        game.step(0.0, SIM_DT);
        game.world_mut().set_gravity(Vec2::ZERO);
        let levels = game.levels;
        for x in [290.0, 310.0] {
            game.table.spawn(
                &mut game.world,
                fruit_body(&levels, game.material, Vec2::new(x, 75.0), 0, false).unwrap(),
            );
        }

        let events = game.step(100.0, SIM_DT);
        let created = events
            .iter()
            .find_map(|e| match e {
                GameEvent::Merged { created, .. } => Some(*created),
                _ => None,
            })
            .expect("the two fruits merge");
        assert!(!events.contains(&GameEvent::BodyStuck { body: created }));
        assert_eq!(game.detector().stuck_since(created), None);

        // Eligible one step later
        let events = game.step(110.0, SIM_DT);
        assert!(events.contains(&GameEvent::BodyStuck { body: created }));
        assert_eq!(game.detector().stuck_since(created), Some(110.0));
    }

    #[test]
    fn test_leaving_band_at_999ms_keeps_playing() {
        let mut game = game();
        game.step(0.0, SIM_DT);
        let stuck = parked_fruit(&mut game, Vec2::new(300.0, 75.0), 1);
        game.step(100.0, SIM_DT);
        game.step(1098.0, SIM_DT);
        game.world_mut().set_position(stuck, Vec2::new(300.0, 200.0));
        game.step(1099.0, SIM_DT);
        game.step(1500.0, SIM_DT);
        assert!(!game.is_game_over());
    }

    #[test]
    fn test_no_scan_during_drop_cooldown() {
        let mut game = game();
        game.step(0.0, SIM_DT);
        game.on_held_release(200.0, 0.0);
        parked_fruit(&mut game, Vec2::new(300.0, 75.0), 1);
        let events = game.step(10.0, SIM_DT);
        assert!(!events.iter().any(|e| matches!(e, GameEvent::BodyStuck { .. })));
        assert_eq!(game.detector().tracked(), 0);
    }

    #[test]
    fn test_restart_clears_everything() {
        let mut game = game();
        game.step(0.0, SIM_DT);
        game.on_held_release(120.0, 0.0);
        parked_fruit(&mut game, Vec2::new(300.0, 300.0), 3);
        game.score = 500;

        let events = game.restart(100.0);
        assert_eq!(events, vec![GameEvent::Restarted, GameEvent::ScoreChanged { score: 0 }]);
        assert_eq!(game.score(), 0);
        assert!(!game.is_game_over());
        assert_eq!(game.spawner().phase(), SpawnPhase::Ready);
        assert!(game.spawner().next_level() < 5);
        // Only the rebuilt walls remain
        assert_eq!(game.bodies().len(), 3);
        assert_eq!(game.world().body_ids().len(), 3);
    }

    #[test]
    fn test_resize_keeps_bodies_and_reclamps_held() {
        let mut game = game();
        game.step(0.0, SIM_DT);
        let held = game.spawner().held().unwrap();
        game.on_held_move(380.0);
        let fruit = parked_fruit(&mut game, Vec2::new(100.0, 300.0), 0);

        game.resize(200.0, 600.0);
        assert_eq!(game.size(), Vec2::new(200.0, 600.0));
        assert_eq!(game.world().body(fruit).unwrap().position, Vec2::new(50.0, 300.0));

        let radius = game.bodies().get(held).unwrap().render.unwrap().radius;
        let held_pos = game.world().body(held).unwrap().position;
        assert_eq!(held_pos.y, 50.0);
        assert!(held_pos.x >= radius && held_pos.x <= 200.0 - radius);

        let walls = game
            .bodies()
            .iter()
            .filter(|(_, m)| m.kind == BodyKind::Wall)
            .count();
        assert_eq!(walls, 3);

        // Ignored
        game.resize(0.0, 600.0);
        assert_eq!(game.size(), Vec2::new(200.0, 600.0));
    }
}
