//! Fruit level table
//!
//! Index 0 is the smallest fruit; the last entry is terminal and never merges.

use crate::error::{GameError, GameResult};

/// Static description of one fruit level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelDefinition {
    /// Body radius (px)
    pub radius: f32,
    /// Points awarded when this level is created by a merge or sliced
    pub score: u64,
    /// CSS fill color
    pub fill: &'static str,
    /// CSS stroke color
    pub border: &'static str,
    /// Sprite file name, relative to the asset base URL
    pub sprite: &'static str,
}

const fn level(
    radius: f32,
    score: u64,
    fill: &'static str,
    border: &'static str,
    sprite: &'static str,
) -> LevelDefinition {
    LevelDefinition {
        radius,
        score,
        fill,
        border,
        sprite,
    }
}

/// The standard eleven-level progression
pub static FRUIT_LEVELS: [LevelDefinition; 11] = [
    level(18.0, 2, "#FFFACD", "#FFD700", "level_00.png"),
    level(24.0, 4, "#FFA07A", "#FF4500", "level_01.png"),
    level(30.0, 8, "#FF6347", "#DC143C", "level_02.png"),
    level(34.0, 16, "#90EE90", "#3CB371", "level_03.png"),
    level(42.0, 32, "#32CD32", "#228B22", "level_04.png"),
    level(52.0, 64, "#87CEFA", "#4682B4", "level_05.png"),
    level(64.0, 128, "#4169E1", "#191970", "level_06.png"),
    level(76.0, 256, "#9932CC", "#800080", "level_07.png"),
    level(88.0, 512, "#FFD700", "#B8860B", "level_08.png"),
    level(100.0, 1024, "#C0C0C0", "#808080", "level_09.png"),
    level(115.0, 2048, "#228B22", "#3CB371", "level_10.png"),
];

/// Read-only view over an ordered level list
#[derive(Debug, Clone, Copy)]
pub struct LevelTable {
    levels: &'static [LevelDefinition],
}

impl Default for LevelTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl LevelTable {
    /// Wrap a custom table. It must not be empty.
    pub fn new(levels: &'static [LevelDefinition]) -> Self {
        debug_assert!(!levels.is_empty(), "level table must not be empty");
        Self { levels }
    }

    pub fn standard() -> Self {
        Self::new(&FRUIT_LEVELS)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn get(&self, level: usize) -> GameResult<&'static LevelDefinition> {
        self.levels.get(level).ok_or(GameError::UnknownLevel {
            level,
            len: self.levels.len(),
        })
    }

    /// Index of the last level
    #[inline]
    pub fn terminal(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    #[inline]
    pub fn is_terminal(&self, level: usize) -> bool {
        level >= self.terminal()
    }

    pub fn radius(&self, level: usize) -> GameResult<f32> {
        self.get(level).map(|def| def.radius)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static LevelDefinition> {
        self.levels.iter()
    }
}
