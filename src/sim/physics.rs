//! Physics engine seam
//!
//! The game layer never integrates bodies itself. It drives an engine through
//! [`PhysicsWorld`] and reacts to the begin-contact batch each step returns.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Stable engine-assigned body handle. Never reused within a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyId(pub u32);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Collision shape, in body-local coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle { radius: f32 },
    /// Axis-aligned box (walls)
    Rect { half_extents: Vec2 },
}

/// How the engine moves a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Motion {
    /// Integrated and pushed by contacts
    Dynamic,
    /// Moved only by explicit position/velocity writes
    Kinematic,
    /// Never moves
    Static,
}

/// Surface and mass properties
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub restitution: f32,
    pub friction: f32,
    pub density: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            restitution: 0.0,
            friction: 0.1,
            density: 0.001,
        }
    }
}

/// Everything needed to create a body
#[derive(Debug, Clone, PartialEq)]
pub struct BodyDesc {
    pub shape: Shape,
    pub position: Vec2,
    pub angle: f32,
    pub velocity: Vec2,
    pub angular_velocity: f32,
    pub motion: Motion,
    /// Sensors never generate contacts
    pub sensor: bool,
    pub material: Material,
}

impl BodyDesc {
    pub fn circle(position: Vec2, radius: f32, material: Material) -> Self {
        Self {
            shape: Shape::Circle { radius },
            position,
            angle: 0.0,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            motion: Motion::Dynamic,
            sensor: false,
            material,
        }
    }

    pub fn static_rect(center: Vec2, size: Vec2) -> Self {
        Self {
            shape: Shape::Rect {
                half_extents: size * 0.5,
            },
            position: center,
            angle: 0.0,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            motion: Motion::Static,
            sensor: false,
            material: Material::default(),
        }
    }
}

/// Snapshot of a body's kinematic state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub shape: Shape,
    pub position: Vec2,
    pub angle: f32,
    pub velocity: Vec2,
    pub angular_velocity: f32,
    pub motion: Motion,
    pub sensor: bool,
}

impl BodyState {
    #[inline]
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }
}

/// Two bodies that started touching during a step (`a < b`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContactPair {
    pub a: BodyId,
    pub b: BodyId,
}

impl ContactPair {
    pub fn new(a: BodyId, b: BodyId) -> Self {
        if a <= b { Self { a, b } } else { Self { a: b, b: a } }
    }
}

/// Rigid-body engine consumed by the game layer.
///
/// Setters on unknown ids are no-ops. Removed ids must never appear in a
/// later contact batch or query result.
pub trait PhysicsWorld {
    /// Create and insert a body
    fn insert(&mut self, desc: BodyDesc) -> BodyId;

    /// Remove a body; returns false if it was not present
    fn remove(&mut self, id: BodyId) -> bool;

    /// Remove every body
    fn clear(&mut self);

    fn body(&self, id: BodyId) -> Option<BodyState>;

    /// All live ids, ascending
    fn body_ids(&self) -> Vec<BodyId>;

    fn set_position(&mut self, id: BodyId, position: Vec2);

    fn set_velocity(&mut self, id: BodyId, velocity: Vec2);

    fn set_angular_velocity(&mut self, id: BodyId, angular_velocity: f32);

    /// Switch between kinematic/dynamic and toggle contact generation
    fn set_motion(&mut self, id: BodyId, motion: Motion, sensor: bool);

    fn gravity(&self) -> Vec2;

    fn set_gravity(&mut self, gravity: Vec2);

    /// Bodies whose shape intersects the segment `from`-`to`, ascending by id
    fn segment_query(&self, from: Vec2, to: Vec2) -> Vec<BodyId>;

    /// Advance by `dt` seconds and return the begin-contact batch of this step
    fn step(&mut self, dt: f32) -> Vec<ContactPair>;

    fn contains(&self, id: BodyId) -> bool {
        self.body(id).is_some()
    }
}
