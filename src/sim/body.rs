//! Game-side body metadata and factories
//!
//! The engine only knows shapes and motion. What a body *is* (fruit, debris,
//! wall), whether it is held, and how to draw it lives in [`BodyTable`],
//! keyed by the engine's [`BodyId`].

use std::collections::BTreeMap;

use glam::Vec2;

use super::arc::SliceArc;
use super::levels::LevelTable;
use super::physics::{BodyDesc, BodyId, Material, Motion, PhysicsWorld};
use crate::error::GameResult;

/// Gameplay role of a body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Mergeable, sliceable fruit
    Fruit { level: usize },
    /// Non-colliding half of a sliced fruit
    Debris { level: usize },
    /// Static playfield boundary
    Wall,
}

impl BodyKind {
    pub fn level(&self) -> Option<usize> {
        match *self {
            BodyKind::Fruit { level } | BodyKind::Debris { level } => Some(level),
            BodyKind::Wall => None,
        }
    }

    #[inline]
    pub fn is_fruit(&self) -> bool {
        matches!(self, BodyKind::Fruit { .. })
    }
}

/// What the renderer needs to draw a body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderMeta {
    pub level: usize,
    pub radius: f32,
    pub fill: &'static str,
    pub border: &'static str,
    pub sprite: &'static str,
}

/// Side-table entry for one engine body
#[derive(Debug, Clone, PartialEq)]
pub struct GameBodyMeta {
    pub kind: BodyKind,
    /// Kinematic, non-colliding, following the pointer
    pub is_held: bool,
    /// Present on debris halves only
    pub slice_arc: Option<SliceArc>,
    pub render: Option<RenderMeta>,
}

impl GameBodyMeta {
    pub fn wall() -> Self {
        Self {
            kind: BodyKind::Wall,
            is_held: false,
            slice_arc: None,
            render: None,
        }
    }

    /// Non-held fruit of a level
    pub fn fruit_level(&self) -> Option<usize> {
        match self.kind {
            BodyKind::Fruit { level } if !self.is_held => Some(level),
            _ => None,
        }
    }
}

fn render_meta(levels: &LevelTable, level: usize) -> GameResult<RenderMeta> {
    let def = levels.get(level)?;
    Ok(RenderMeta {
        level,
        radius: def.radius,
        fill: def.fill,
        border: def.border,
        sprite: def.sprite,
    })
}

/// Build a fruit body of `level` at `position`
///
/// Held fruit is kinematic and non-colliding. Nothing is inserted.
pub fn fruit_body(
    levels: &LevelTable,
    material: Material,
    position: Vec2,
    level: usize,
    held: bool,
) -> GameResult<(BodyDesc, GameBodyMeta)> {
    let render = render_meta(levels, level)?;
    let mut desc = BodyDesc::circle(position, render.radius, material);
    if held {
        desc.motion = Motion::Kinematic;
        desc.sensor = true;
    }
    let meta = GameBodyMeta {
        kind: BodyKind::Fruit { level },
        is_held: held,
        slice_arc: None,
        render: Some(render),
    };
    Ok((desc, meta))
}

/// Build one half of a sliced fruit
pub fn debris_body(
    levels: &LevelTable,
    material: Material,
    position: Vec2,
    angle: f32,
    level: usize,
    arc: SliceArc,
) -> GameResult<(BodyDesc, GameBodyMeta)> {
    let render = render_meta(levels, level)?;
    let mut desc = BodyDesc::circle(position, render.radius, material);
    desc.angle = angle;
    desc.sensor = true;
    let meta = GameBodyMeta {
        kind: BodyKind::Debris { level },
        is_held: false,
        slice_arc: Some(arc),
        render: Some(render),
    };
    Ok((desc, meta))
}

/// Metadata for every body the game created, keyed by engine id
#[derive(Debug, Clone, Default)]
pub struct BodyTable {
    entries: BTreeMap<BodyId, GameBodyMeta>,
}

impl BodyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the body into the world and record its metadata
    pub fn spawn<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
        (desc, meta): (BodyDesc, GameBodyMeta),
    ) -> BodyId {
        let id = world.insert(desc);
        self.entries.insert(id, meta);
        id
    }

    /// Remove the body from both the world and the table
    pub fn despawn<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
        id: BodyId,
    ) -> Option<GameBodyMeta> {
        world.remove(id);
        self.entries.remove(&id)
    }

    pub fn get(&self, id: BodyId) -> Option<&GameBodyMeta> {
        self.entries.get(&id)
    }

    pub fn get_mut(&mut self, id: BodyId) -> Option<&mut GameBodyMeta> {
        self.entries.get_mut(&id)
    }

    /// Entries in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = (BodyId, &GameBodyMeta)> {
        self.entries.iter().map(|(id, meta)| (*id, meta))
    }

    /// Ids matching a predicate, ascending
    pub fn ids_where(&self, mut pred: impl FnMut(&GameBodyMeta) -> bool) -> Vec<BodyId> {
        self.entries
            .iter()
            .filter(|(_, meta)| pred(meta))
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget every entry (the caller clears the world)
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GameError;
    use crate::sim::CircleWorld;
    use crate::sim::physics::Shape;

    #[test]
    fn test_held_fruit_is_kinematic_sensor() {
        let levels = LevelTable::standard();
        let (desc, meta) =
            fruit_body(&levels, Material::default(), Vec2::new(10.0, 50.0), 2, true).unwrap();
        assert_eq!(desc.motion, Motion::Kinematic);
        assert!(desc.sensor);
        assert_eq!(desc.shape, Shape::Circle { radius: 30.0 });
        assert!(meta.is_held);
        assert_eq!(meta.fruit_level(), None);
        assert_eq!(meta.render.unwrap().fill, "#FF6347");
    }

    #[test]
    fn test_dropped_fruit_is_dynamic() {
        let levels = LevelTable::standard();
        let (desc, meta) = fruit_body(&levels, Material::default(), Vec2::ZERO, 0, false).unwrap();
        assert_eq!(desc.motion, Motion::Dynamic);
        assert!(!desc.sensor);
        assert_eq!(meta.fruit_level(), Some(0));
    }

    #[test]
    fn test_out_of_range_level() {
        let levels = LevelTable::standard();
        let result = fruit_body(&levels, Material::default(), Vec2::ZERO, 42, false);
        assert!(matches!(result, Err(GameError::UnknownLevel { level: 42, .. })));
    }

    #[test]
    fn test_debris_keeps_angle_and_arc() {
        let levels = LevelTable::standard();
        let arc = SliceArc::new(0.5, 0.5 + std::f32::consts::PI);
        let (desc, meta) =
            debris_body(&levels, Material::default(), Vec2::ONE, 1.25, 4, arc).unwrap();
        assert_eq!(desc.angle, 1.25);
        assert!(desc.sensor);
        assert_eq!(desc.motion, Motion::Dynamic);
        assert_eq!(meta.kind, BodyKind::Debris { level: 4 });
        assert_eq!(meta.slice_arc, Some(arc));
    }

    #[test]
    fn test_spawn_and_despawn() {
        let levels = LevelTable::standard();
        let mut world = CircleWorld::default();
        let mut table = BodyTable::new();
        let id = table.spawn(
            &mut world,
            fruit_body(&levels, Material::default(), Vec2::ZERO, 0, false).unwrap(),
        );
        assert!(world.contains(id));
        assert!(table.get(id).is_some());

        assert!(table.despawn(&mut world, id).is_some());
        assert!(!world.contains(id));
        assert!(table.is_empty());
        assert!(table.despawn(&mut world, id).is_none());
    }
}
