//! Stuck-fruit game-over heuristic
//!
//! A fruit resting inside the danger band just under the spawn line for long
//! enough means the pile has reached the top.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;

use super::physics::BodyId;
use crate::tuning::DropTuning;

/// Minimal per-candidate input for a scan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub body: BodyId,
    pub position: Vec2,
    pub speed: f32,
}

/// Outcome of one scan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanResult {
    /// Bodies whose stuck timer started this scan
    pub newly_stuck: Vec<BodyId>,
    /// Set when a body has been stuck long enough
    pub game_over: bool,
}

/// Tracks when each fruit started resting in the danger band
#[derive(Debug, Clone)]
pub struct GameOverDetector {
    band_top: f32,
    band_bottom: f32,
    stuck_speed: f32,
    stuck_duration_ms: f64,
    timers: BTreeMap<BodyId, f64>,
}

impl GameOverDetector {
    pub fn new(tuning: &DropTuning) -> Self {
        Self {
            band_top: tuning.danger_band_top,
            band_bottom: tuning.danger_band_bottom,
            stuck_speed: tuning.stuck_speed,
            stuck_duration_ms: tuning.stuck_duration_ms,
            timers: BTreeMap::new(),
        }
    }

    #[inline]
    fn in_band(&self, y: f32) -> bool {
        y > self.band_top && y < self.band_bottom
    }

    /// Update timers for every candidate present this step
    ///
    /// Candidates missing from the list have their timers dropped.
    pub fn scan(&mut self, now_ms: f64, candidates: &[Candidate]) -> ScanResult {
        let mut result = ScanResult::default();
        let present: BTreeSet<BodyId> = candidates.iter().map(|c| c.body).collect();
        self.timers.retain(|id, _| present.contains(id));

        for candidate in candidates {
            let stuck = self.in_band(candidate.position.y) && candidate.speed < self.stuck_speed;
            if !stuck {
                self.timers.remove(&candidate.body);
                continue;
            }

            match self.timers.get(&candidate.body) {
                None => {
                    self.timers.insert(candidate.body, now_ms);
                    result.newly_stuck.push(candidate.body);
                }
                Some(&since) if now_ms - since >= self.stuck_duration_ms => {
                    result.game_over = true;
                }
                Some(_) => {}
            }
        }

        result
    }

    /// When `body` started resting in the band, if it is
    pub fn stuck_since(&self, body: BodyId) -> Option<f64> {
        self.timers.get(&body).copied()
    }

    pub fn tracked(&self) -> usize {
        self.timers.len()
    }

    pub fn reset(&mut self) {
        self.timers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resting(body: u32, y: f32) -> Candidate {
        Candidate {
            body: BodyId(body),
            position: Vec2::new(100.0, y),
            speed: 0.0,
        }
    }

    #[test]
    fn test_leaving_at_999ms_prevents_game_over() {
        let mut detector = GameOverDetector::new(&DropTuning::default());
        let inside = [resting(1, 75.0)];

        let first = detector.scan(0.0, &inside);
        assert_eq!(first.newly_stuck, vec![BodyId(1)]);
        assert!(!first.game_over);
        assert!(!detector.scan(999.0, &inside).game_over);

        // Leaves the band
        assert!(!detector.scan(999.5, &[resting(1, 120.0)]).game_over);
        assert_eq!(detector.stuck_since(BodyId(1)), None);

        // Back in: the timer starts over
        assert!(!detector.scan(1001.0, &inside).game_over);
        assert_eq!(detector.stuck_since(BodyId(1)), Some(1001.0));
    }

    #[test]
    fn test_staying_through_1001ms_ends_game() {
        let mut detector = GameOverDetector::new(&DropTuning::default());
        let inside = [resting(1, 75.0)];
        detector.scan(0.0, &inside);
        assert!(!detector.scan(500.0, &inside).game_over);
        assert!(detector.scan(1001.0, &inside).game_over);
    }

    #[test]
    fn test_exactly_threshold_counts() {
        let mut detector = GameOverDetector::new(&DropTuning::default());
        let inside = [resting(1, 75.0)];
        detector.scan(0.0, &inside);
        assert!(detector.scan(1000.0, &inside).game_over);
    }

    #[test]
    fn test_band_bounds_are_exclusive() {
        let mut detector = GameOverDetector::new(&DropTuning::default());
        let result = detector.scan(0.0, &[resting(1, 70.0), resting(2, 80.0)]);
        assert!(result.newly_stuck.is_empty());
        assert_eq!(detector.tracked(), 0);
    }

    #[test]
    fn test_moving_fruit_not_stuck() {
        let mut detector = GameOverDetector::new(&DropTuning::default());
        let moving = Candidate {
            body: BodyId(1),
            position: Vec2::new(0.0, 75.0),
            speed: 12.0,
        };
        detector.scan(0.0, &[moving]);
        assert_eq!(detector.tracked(), 0);
    }

    #[test]
    fn test_vanished_bodies_pruned() {
        let mut detector = GameOverDetector::new(&DropTuning::default());
        detector.scan(0.0, &[resting(1, 75.0), resting(2, 76.0)]);
        assert_eq!(detector.tracked(), 2);
        // Body 1 merged away
        detector.scan(16.0, &[resting(2, 76.0)]);
        assert_eq!(detector.tracked(), 1);
        assert_eq!(detector.stuck_since(BodyId(1)), None);
    }

    #[test]
    fn test_pruning_keeps_every_present_body() {
        let mut detector = GameOverDetector::new(&DropTuning::default());
        let all: Vec<_> = (0..500).map(|i| resting(i, 75.0)).collect();
        detector.scan(0.0, &all);
        assert_eq!(detector.tracked(), 500);

        let odd: Vec<_> = all.iter().copied().filter(|c| c.body.0 % 2 == 1).collect();
        detector.scan(16.0, &odd);
        assert_eq!(detector.tracked(), 250);
        assert_eq!(detector.stuck_since(BodyId(3)), Some(0.0));
        assert_eq!(detector.stuck_since(BodyId(4)), None);
    }
}
