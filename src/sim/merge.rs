//! Equal-level merge resolution
//!
//! Runs once per engine step over that step's begin-contact batch.

use std::collections::BTreeSet;

use super::body::{BodyTable, fruit_body};
use super::levels::LevelTable;
use super::physics::{BodyId, ContactPair, Material, PhysicsWorld};
use super::state::GameEvent;

/// Merge equal-level fruit pairs of one contact batch
///
/// Pairs are processed in delivery order. An id merges at most once per
/// batch; stale, held, non-fruit, mismatched and terminal pairs are skipped.
/// Fruit created here only takes part in later batches.
pub fn resolve_merges<W: PhysicsWorld + ?Sized>(
    pairs: &[ContactPair],
    world: &mut W,
    table: &mut BodyTable,
    levels: &LevelTable,
    material: Material,
    score: &mut u64,
) -> Vec<GameEvent> {
    let mut consumed: BTreeSet<BodyId> = BTreeSet::new();
    let mut events = Vec::new();

    for pair in pairs {
        if consumed.contains(&pair.a) || consumed.contains(&pair.b) {
            continue;
        }

        let level = match (mergeable_level(table, pair.a), mergeable_level(table, pair.b)) {
            (Some(la), Some(lb)) if la == lb => la,
            _ => continue,
        };
        if levels.is_terminal(level) {
            continue;
        }

        let (Some(a), Some(b)) = (world.body(pair.a), world.body(pair.b)) else {
            continue;
        };
        let midpoint = (a.position + b.position) * 0.5;

        let created_level = level + 1;
        let desc = match fruit_body(levels, material, midpoint, created_level, false) {
            Ok(desc) => desc,
            Err(e) => {
                log::warn!("Skipping merge of {} and {}: {}", pair.a, pair.b, e);
                continue;
            }
        };

        consumed.insert(pair.a);
        consumed.insert(pair.b);
        table.despawn(world, pair.a);
        table.despawn(world, pair.b);
        let created = table.spawn(world, desc);

        let gained = levels.get(created_level).map(|def| def.score).unwrap_or(0);
        *score += gained;

        log::debug!(
            "Merged {} + {} (level {}) into {} (+{})",
            pair.a,
            pair.b,
            level,
            created,
            gained
        );
        events.push(GameEvent::Merged {
            consumed: [pair.a, pair.b],
            created,
            level: created_level,
        });
        events.push(GameEvent::ScoreChanged { score: *score });
    }

    events
}

/// Level of a live, non-held fruit
fn mergeable_level(table: &BodyTable, id: BodyId) -> Option<usize> {
    table.get(id).and_then(|meta| meta.fruit_level())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::CircleWorld;
    use crate::sim::body::{BodyKind, GameBodyMeta};
    use glam::Vec2;
    use proptest::prelude::*;

    struct Fixture {
        world: CircleWorld,
        table: BodyTable,
        levels: LevelTable,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                world: CircleWorld::default(),
                table: BodyTable::new(),
                levels: LevelTable::standard(),
            }
        }

        fn fruit(&mut self, x: f32, level: usize, held: bool) -> BodyId {
            let desc = fruit_body(
                &self.levels,
                Material::default(),
                Vec2::new(x, 100.0),
                level,
                held,
            )
            .unwrap();
            self.table.spawn(&mut self.world, desc)
        }

        fn resolve(&mut self, pairs: &[ContactPair], score: &mut u64) -> Vec<GameEvent> {
            resolve_merges(
                pairs,
                &mut self.world,
                &mut self.table,
                &self.levels,
                Material::default(),
                score,
            )
        }
    }

    #[test]
    fn test_every_level_merges_up() {
        for level in 0..10 {
            let mut fx = Fixture::new();
            let a = fx.fruit(100.0, level, false);
            let b = fx.fruit(140.0, level, false);
            let mut score = 0;
            let events = fx.resolve(&[ContactPair::new(a, b)], &mut score);

            let expected = fx.levels.get(level + 1).unwrap().score;
            assert_eq!(score, expected);
            let Some(GameEvent::Merged { consumed, created, level: new_level }) = events.first()
            else {
                panic!("expected Merged, got {:?}", events);
            };
            assert_eq!(*consumed, [a, b]);
            assert_eq!(*new_level, level + 1);
            assert_eq!(events[1], GameEvent::ScoreChanged { score: expected });

            assert!(!fx.world.contains(a) && !fx.world.contains(b));
            assert!(fx.table.get(a).is_none());
            let created_state = fx.world.body(*created).unwrap();
            assert_eq!(created_state.position, Vec2::new(120.0, 100.0));
            assert_eq!(
                fx.table.get(*created).unwrap().kind,
                BodyKind::Fruit { level: level + 1 }
            );
        }
    }

    #[test]
    fn test_terminal_level_never_merges() {
        let mut fx = Fixture::new();
        let a = fx.fruit(100.0, 10, false);
        let b = fx.fruit(200.0, 10, false);
        let mut score = 0;
        assert!(fx.resolve(&[ContactPair::new(a, b)], &mut score).is_empty());
        assert_eq!(score, 0);
        assert!(fx.world.contains(a) && fx.world.contains(b));
    }

    #[test]
    fn test_mismatched_levels_ignored() {
        let mut fx = Fixture::new();
        let a = fx.fruit(100.0, 1, false);
        let b = fx.fruit(140.0, 2, false);
        let mut score = 0;
        assert!(fx.resolve(&[ContactPair::new(a, b)], &mut score).is_empty());
    }

    #[test]
    fn test_held_and_walls_ignored() {
        let mut fx = Fixture::new();
        let a = fx.fruit(100.0, 1, false);
        let held = fx.fruit(140.0, 1, true);
        let wall = fx.table.spawn(
            &mut fx.world,
            (
                crate::sim::physics::BodyDesc::static_rect(Vec2::ZERO, Vec2::ONE),
                GameBodyMeta::wall(),
            ),
        );
        let mut score = 0;
        let pairs = [ContactPair::new(a, held), ContactPair::new(a, wall)];
        assert!(fx.resolve(&pairs, &mut score).is_empty());
        assert!(fx.world.contains(held));
    }

    #[test]
    fn test_stale_ids_ignored() {
        let mut fx = Fixture::new();
        let a = fx.fruit(100.0, 0, false);
        let mut score = 0;
        let events = fx.resolve(&[ContactPair::new(a, BodyId(999))], &mut score);
        assert!(events.is_empty());
        assert!(fx.world.contains(a));
    }

    #[test]
    fn test_three_way_contact_merges_once() {
        let mut fx = Fixture::new();
        let a = fx.fruit(100.0, 3, false);
        let b = fx.fruit(130.0, 3, false);
        let c = fx.fruit(160.0, 3, false);
        let mut score = 0;
        let pairs = [
            ContactPair::new(a, b),
            ContactPair::new(b, c),
            ContactPair::new(a, c),
        ];
        let events = fx.resolve(&pairs, &mut score);
        let merges = events
            .iter()
            .filter(|e| matches!(e, GameEvent::Merged { .. }))
            .count();
        assert_eq!(merges, 1);
        // c waits for a later batch
        assert!(fx.world.contains(c));
        assert_eq!(score, 32);
    }

    proptest! {
        #[test]
        fn prop_no_id_consumed_twice(
            levels in prop::collection::vec(0usize..3, 2..12),
            raw_pairs in prop::collection::vec((0usize..12, 0usize..12), 0..40),
        ) {
            let mut fx = Fixture::new();
            let ids: Vec<BodyId> = levels
                .iter()
                .enumerate()
                .map(|(i, level)| fx.fruit(i as f32 * 50.0, *level, false))
                .collect();
            let pairs: Vec<ContactPair> = raw_pairs
                .into_iter()
                .filter(|(i, j)| i != j && *i < ids.len() && *j < ids.len())
                .map(|(i, j)| ContactPair::new(ids[i], ids[j]))
                .collect();

            let mut score = 0;
            let events = fx.resolve(&pairs, &mut score);

            let mut seen = BTreeSet::new();
            let mut expected_score = 0;
            for event in &events {
                if let GameEvent::Merged { consumed, level, .. } = event {
                    for id in consumed {
                        prop_assert!(seen.insert(*id), "{} consumed twice", id);
                        prop_assert!(ids.contains(id), "created body merged in same batch");
                    }
                    expected_score += fx.levels.get(*level).unwrap().score;
                }
            }
            prop_assert_eq!(score, expected_score);
        }
    }
}
