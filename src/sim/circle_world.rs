//! Reference rigid-body engine
//!
//! Small impulse solver for circles and static boxes: semi-implicit Euler
//! integration, iterative positional correction, restitution and Coulomb
//! friction, begin-contact tracking and segment queries. Good enough for a
//! fruit pile; the game layer only depends on [`PhysicsWorld`].

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;

use super::collision::{
    CollisionResult, circle_circle_collision, rect_circle_collision, segment_hits_circle,
    segment_hits_rect,
};
use super::physics::{BodyDesc, BodyId, BodyState, ContactPair, Material, Motion, PhysicsWorld, Shape};

/// Solver passes per step
const SOLVER_ITERATIONS: usize = 6;
/// Penetration allowed before positional correction kicks in (px)
const PENETRATION_SLOP: f32 = 0.05;
/// Fraction of the remaining penetration removed per pass
const CORRECTION_PERCENT: f32 = 0.6;
/// Linear drag per second (matches a light air friction)
const AIR_DRAG: f32 = 0.6;
/// Angular drag per second
const ANGULAR_DRAG: f32 = 1.2;

#[derive(Debug, Clone)]
struct Body {
    shape: Shape,
    position: Vec2,
    angle: f32,
    velocity: Vec2,
    angular_velocity: f32,
    motion: Motion,
    sensor: bool,
    material: Material,
    inv_mass: f32,
    inv_inertia: f32,
}

impl Body {
    fn from_desc(desc: BodyDesc) -> Self {
        let mut body = Self {
            shape: desc.shape,
            position: desc.position,
            angle: desc.angle,
            velocity: desc.velocity,
            angular_velocity: desc.angular_velocity,
            motion: desc.motion,
            sensor: desc.sensor,
            material: desc.material,
            inv_mass: 0.0,
            inv_inertia: 0.0,
        };
        body.update_mass();
        body
    }

    fn update_mass(&mut self) {
        if self.motion != Motion::Dynamic {
            self.inv_mass = 0.0;
            self.inv_inertia = 0.0;
            return;
        }
        let (area, inertia_factor) = match self.shape {
            Shape::Circle { radius } => (std::f32::consts::PI * radius * radius, 0.5 * radius * radius),
            Shape::Rect { half_extents } => {
                let size = half_extents * 2.0;
                (size.x * size.y, size.length_squared() / 12.0)
            }
        };
        let mass = (area * self.material.density).max(1e-6);
        self.inv_mass = 1.0 / mass;
        self.inv_inertia = 1.0 / (mass * inertia_factor).max(1e-6);
    }

    fn state(&self) -> BodyState {
        BodyState {
            shape: self.shape,
            position: self.position,
            angle: self.angle,
            velocity: self.velocity,
            angular_velocity: self.angular_velocity,
            motion: self.motion,
            sensor: self.sensor,
        }
    }

    /// Contact radius used for friction torque
    fn radius(&self) -> f32 {
        match self.shape {
            Shape::Circle { radius } => radius,
            Shape::Rect { half_extents } => half_extents.min_element(),
        }
    }
}

/// Contact between two bodies, normal pointing from `a` to `b`
struct Contact {
    a: BodyId,
    b: BodyId,
    result: CollisionResult,
}

/// Reference implementation of [`PhysicsWorld`]
#[derive(Debug, Clone)]
pub struct CircleWorld {
    bodies: BTreeMap<BodyId, Body>,
    next_id: u32,
    gravity: Vec2,
    /// Pairs touching at the end of the previous step
    touching: BTreeSet<ContactPair>,
}

impl Default for CircleWorld {
    fn default() -> Self {
        Self::new(Vec2::ZERO)
    }
}

impl CircleWorld {
    pub fn new(gravity: Vec2) -> Self {
        Self {
            bodies: BTreeMap::new(),
            next_id: 1,
            gravity,
            touching: BTreeSet::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    fn test_pair(a: &Body, b: &Body) -> CollisionResult {
        match (a.shape, b.shape) {
            (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
                circle_circle_collision(a.position, ra, b.position, rb)
            }
            (Shape::Rect { half_extents }, Shape::Circle { radius }) => {
                rect_circle_collision(a.position, half_extents, b.position, radius)
            }
            (Shape::Circle { radius }, Shape::Rect { half_extents }) => {
                rect_circle_collision(b.position, half_extents, a.position, radius).flipped()
            }
            // Box-box contacts never happen between walls
            (Shape::Rect { .. }, Shape::Rect { .. }) => CollisionResult::miss(),
        }
    }

    fn find_contacts(&self) -> Vec<Contact> {
        let solid: Vec<(BodyId, &Body)> = self
            .bodies
            .iter()
            .filter(|(_, b)| !b.sensor)
            .map(|(id, b)| (*id, b))
            .collect();

        let mut contacts = Vec::new();
        for i in 0..solid.len() {
            let (id_a, a) = solid[i];
            for &(id_b, b) in &solid[i + 1..] {
                // At least one side has to move
                if a.motion != Motion::Dynamic && b.motion != Motion::Dynamic {
                    continue;
                }
                let result = Self::test_pair(a, b);
                if result.hit {
                    contacts.push(Contact {
                        a: id_a,
                        b: id_b,
                        result,
                    });
                }
            }
        }
        contacts
    }

    fn resolve(&mut self, contact: &Contact) {
        let (Some(a), Some(b)) = (self.bodies.get(&contact.a), self.bodies.get(&contact.b)) else {
            return;
        };
        let (ia, ib) = (a.inv_mass, b.inv_mass);
        let inv_sum = ia + ib;
        if inv_sum <= 0.0 {
            return;
        }

        let n = contact.result.normal;
        let depth = contact.result.penetration;
        let correction = n * ((depth - PENETRATION_SLOP).max(0.0) / inv_sum) * CORRECTION_PERCENT;

        let rel = b.velocity - a.velocity;
        let vn = rel.dot(n);

        let mut impulse = Vec2::ZERO;
        let mut friction = Vec2::ZERO;
        if vn < 0.0 {
            let e = a.material.restitution.max(b.material.restitution);
            let j = -(1.0 + e) * vn / inv_sum;
            impulse = n * j;

            let tangent = (rel - n * vn).normalize_or_zero();
            let mu = a.material.friction.min(b.material.friction);
            let jt = (-rel.dot(tangent) / inv_sum).clamp(-j * mu, j * mu);
            friction = tangent * jt;
        }

        let (ra, rb) = (n * a.radius(), -n * b.radius());
        let (inertia_a, inertia_b) = (a.inv_inertia, b.inv_inertia);

        if let Some(a) = self.bodies.get_mut(&contact.a) {
            a.position -= correction * ia;
            a.velocity -= (impulse + friction) * ia;
            a.angular_velocity += ra.perp_dot(-friction) * inertia_a;
        }
        if let Some(b) = self.bodies.get_mut(&contact.b) {
            b.position += correction * ib;
            b.velocity += (impulse + friction) * ib;
            b.angular_velocity += rb.perp_dot(friction) * inertia_b;
        }
    }
}

impl PhysicsWorld for CircleWorld {
    fn insert(&mut self, desc: BodyDesc) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;
        self.bodies.insert(id, Body::from_desc(desc));
        id
    }

    fn remove(&mut self, id: BodyId) -> bool {
        self.touching.retain(|p| p.a != id && p.b != id);
        self.bodies.remove(&id).is_some()
    }

    fn clear(&mut self) {
        self.bodies.clear();
        self.touching.clear();
    }

    fn body(&self, id: BodyId) -> Option<BodyState> {
        self.bodies.get(&id).map(Body::state)
    }

    fn body_ids(&self) -> Vec<BodyId> {
        self.bodies.keys().copied().collect()
    }

    fn set_position(&mut self, id: BodyId, position: Vec2) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.position = position;
        }
    }

    fn set_velocity(&mut self, id: BodyId, velocity: Vec2) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.velocity = velocity;
        }
    }

    fn set_angular_velocity(&mut self, id: BodyId, angular_velocity: f32) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.angular_velocity = angular_velocity;
        }
    }

    fn set_motion(&mut self, id: BodyId, motion: Motion, sensor: bool) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.motion = motion;
            body.sensor = sensor;
            body.update_mass();
        }
        if sensor {
            self.touching.retain(|p| p.a != id && p.b != id);
        }
    }

    fn gravity(&self) -> Vec2 {
        self.gravity
    }

    fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    fn segment_query(&self, from: Vec2, to: Vec2) -> Vec<BodyId> {
        self.bodies
            .iter()
            .filter(|(_, body)| match body.shape {
                Shape::Circle { radius } => segment_hits_circle(from, to, body.position, radius),
                Shape::Rect { half_extents } => {
                    segment_hits_rect(from, to, body.position, half_extents)
                }
            })
            .map(|(id, _)| *id)
            .collect()
    }

    fn step(&mut self, dt: f32) -> Vec<ContactPair> {
        let drag = (1.0 - AIR_DRAG * dt).max(0.0);
        let angular_drag = (1.0 - ANGULAR_DRAG * dt).max(0.0);

        // Integrate
        for body in self.bodies.values_mut() {
            match body.motion {
                Motion::Dynamic => {
                    body.velocity += self.gravity * dt;
                    body.velocity *= drag;
                    body.angular_velocity *= angular_drag;
                    body.position += body.velocity * dt;
                    body.angle += body.angular_velocity * dt;
                }
                Motion::Kinematic => {
                    body.position += body.velocity * dt;
                    body.angle += body.angular_velocity * dt;
                }
                Motion::Static => {}
            }
        }

        // Solve contacts, remembering every pair that touched this step
        let mut now_touching = BTreeSet::new();
        for _ in 0..SOLVER_ITERATIONS {
            let contacts = self.find_contacts();
            if contacts.is_empty() {
                break;
            }
            for contact in &contacts {
                now_touching.insert(ContactPair::new(contact.a, contact.b));
                self.resolve(contact);
            }
        }

        let began: Vec<ContactPair> = now_touching.difference(&self.touching).copied().collect();
        self.touching = now_touching;
        began
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 120.0;

    fn ball(pos: Vec2, radius: f32) -> BodyDesc {
        BodyDesc::circle(
            pos,
            radius,
            Material {
                restitution: 0.2,
                friction: 0.1,
                density: 0.002,
            },
        )
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut world = CircleWorld::default();
        let a = world.insert(ball(Vec2::ZERO, 5.0));
        assert!(world.remove(a));
        let b = world.insert(ball(Vec2::ZERO, 5.0));
        assert_ne!(a, b);
        assert!(!world.remove(a));
    }

    #[test]
    fn test_gravity_moves_dynamic_only() {
        let mut world = CircleWorld::new(Vec2::new(0.0, 1000.0));
        let falling = world.insert(ball(Vec2::new(0.0, 0.0), 5.0));
        let mut held = ball(Vec2::new(100.0, 0.0), 5.0);
        held.motion = Motion::Kinematic;
        held.sensor = true;
        let held = world.insert(held);

        for _ in 0..60 {
            world.step(DT);
        }
        assert!(world.body(falling).unwrap().position.y > 50.0);
        assert_eq!(world.body(held).unwrap().position, Vec2::new(100.0, 0.0));
    }

    #[test]
    fn test_begin_contact_reported_once() {
        let mut world = CircleWorld::new(Vec2::new(0.0, 1000.0));
        let floor = world.insert(BodyDesc::static_rect(
            Vec2::new(0.0, 130.0),
            Vec2::new(400.0, 60.0),
        ));
        let drop = world.insert(ball(Vec2::new(0.0, 50.0), 10.0));

        let mut begins = Vec::new();
        for _ in 0..240 {
            begins.extend(world.step(DT));
        }
        let with_floor: Vec<_> = begins
            .iter()
            .filter(|p| **p == ContactPair::new(floor, drop))
            .collect();
        assert!(!with_floor.is_empty());
        // Resting on the floor must not re-trigger every step
        assert!(with_floor.len() <= 3, "got {} begin events", with_floor.len());

        // Ball rests on top of the floor (floor top edge at y=100)
        let rest = world.body(drop).unwrap();
        assert!((rest.position.y - 90.0).abs() < 2.0, "y = {}", rest.position.y);
    }

    #[test]
    fn test_sensor_never_collides() {
        let mut world = CircleWorld::default();
        let a = world.insert(ball(Vec2::ZERO, 10.0));
        let mut ghost = ball(Vec2::new(5.0, 0.0), 10.0);
        ghost.sensor = true;
        world.insert(ghost);
        assert!(world.step(DT).is_empty());
        assert_eq!(world.body(a).unwrap().position, Vec2::ZERO);
    }

    #[test]
    fn test_removed_body_never_reported() {
        let mut world = CircleWorld::default();
        let a = world.insert(ball(Vec2::ZERO, 10.0));
        let b = world.insert(ball(Vec2::new(15.0, 0.0), 10.0));
        world.remove(b);
        let began = world.step(DT);
        assert!(began.iter().all(|p| p.a != b && p.b != b));
        assert!(world.segment_query(Vec2::new(-50.0, 0.0), Vec2::new(50.0, 0.0)) == vec![a]);
    }

    #[test]
    fn test_overlapping_circles_separate() {
        let mut world = CircleWorld::default();
        let a = world.insert(ball(Vec2::ZERO, 10.0));
        let b = world.insert(ball(Vec2::new(12.0, 0.0), 10.0));
        let began = world.step(DT);
        assert_eq!(began, vec![ContactPair::new(a, b)]);
        for _ in 0..30 {
            world.step(DT);
        }
        let gap = world.body(b).unwrap().position.x - world.body(a).unwrap().position.x;
        assert!(gap > 19.0, "gap = {}", gap);
    }

    #[test]
    fn test_set_motion_releases_kinematic() {
        let mut world = CircleWorld::new(Vec2::new(0.0, 1000.0));
        let mut held = ball(Vec2::ZERO, 5.0);
        held.motion = Motion::Kinematic;
        let id = world.insert(held);
        world.step(DT);
        assert_eq!(world.body(id).unwrap().position, Vec2::ZERO);

        world.set_motion(id, Motion::Dynamic, false);
        world.step(DT);
        assert!(world.body(id).unwrap().position.y > 0.0);
    }
}
