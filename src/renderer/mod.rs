//! Canvas rendering of fruit and debris
//!
//! Draws straight from engine state plus body metadata once per frame, after
//! the simulation step. Rendering is read-only over the world.

pub mod assets;
#[cfg(target_arch = "wasm32")]
pub mod canvas2d;

pub use assets::{AssetRegistry, SpriteSlot};
#[cfg(target_arch = "wasm32")]
pub use canvas2d::WebCanvas;

use glam::Vec2;

use crate::settings::Settings;
use crate::sim::{ArcadeGame, BodyTable, PhysicsWorld};

/// Minimal 2D drawing surface (mirrors the HTML canvas API)
pub trait Canvas {
    type Image;

    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, x: f64, y: f64);
    fn rotate(&mut self, angle: f64);
    fn begin_path(&mut self);
    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn close_path(&mut self);
    fn set_fill_style(&mut self, color: &str);
    fn fill(&mut self);
    fn set_stroke_style(&mut self, color: &str);
    fn set_line_width(&mut self, width: f64);
    fn set_line_cap(&mut self, cap: &str);
    fn stroke(&mut self);
    /// Clip to the current path
    fn clip(&mut self);
    fn draw_image(&mut self, image: &Self::Image, x: f64, y: f64, w: f64, h: f64);
    fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64);
}

/// Draw every fruit and debris body; returns how many were drawn
///
/// Each body is drawn in its own frame: full disc for fruit, wedge for a
/// debris half. The sprite is clipped to the same path when loaded.
pub fn render_bodies<C: Canvas, W: PhysicsWorld + ?Sized>(
    canvas: &mut C,
    world: &W,
    table: &BodyTable,
    assets: &AssetRegistry<C::Image>,
    settings: &Settings,
) -> usize {
    let mut drawn = 0;

    for (id, meta) in table.iter() {
        let Some(render) = meta.render else {
            continue;
        };
        let Some(state) = world.body(id) else {
            continue;
        };
        let r = render.radius as f64;

        canvas.save();
        canvas.translate(state.position.x as f64, state.position.y as f64);
        canvas.rotate(state.angle as f64);

        canvas.begin_path();
        match meta.slice_arc {
            Some(arc) => {
                canvas.move_to(0.0, 0.0);
                canvas.arc(0.0, 0.0, r, arc.start as f64, arc.end as f64);
                canvas.close_path();
            }
            None => canvas.arc(0.0, 0.0, r, 0.0, std::f64::consts::TAU),
        }

        canvas.set_fill_style(render.fill);
        canvas.fill();

        let border = settings.effective_border_width();
        if border > 0.0 {
            canvas.set_line_width(border);
            canvas.set_stroke_style(render.border);
            canvas.stroke();
        }

        if settings.sprites
            && let Some(image) = assets.sprite(render.level)
        {
            canvas.clip();
            canvas.draw_image(image, -r, -r, r * 2.0, r * 2.0);
        }

        canvas.restore();
        drawn += 1;
    }

    drawn
}

/// Stroke the swipe trail as one polyline
pub fn draw_trail<C: Canvas>(
    canvas: &mut C,
    points: impl IntoIterator<Item = Vec2>,
    settings: &Settings,
) {
    if !settings.effective_trail() {
        return;
    }
    let points: Vec<Vec2> = points.into_iter().collect();
    if points.len() < 2 {
        return;
    }

    canvas.save();
    canvas.begin_path();
    canvas.move_to(points[0].x as f64, points[0].y as f64);
    for p in &points[1..] {
        canvas.line_to(p.x as f64, p.y as f64);
    }
    canvas.set_line_cap("round");
    canvas.set_line_width(settings.trail_width as f64);
    canvas.set_stroke_style(&settings.trail_color);
    canvas.stroke();
    canvas.restore();
}

/// Clear the canvas and draw one full frame of `game`
pub fn render_frame<C: Canvas>(
    canvas: &mut C,
    game: &dyn ArcadeGame,
    assets: &AssetRegistry<C::Image>,
    settings: &Settings,
) {
    let size = game.size();
    canvas.clear_rect(0.0, 0.0, size.x as f64, size.y as f64);
    render_bodies(canvas, game.world(), game.bodies(), assets, settings);
    if let Some(trail) = game.trail() {
        draw_trail(canvas, trail.points(), settings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{
        BodyTable, CircleWorld, LevelTable, Material, SliceArc, debris_body, fruit_body,
    };
    use std::f64::consts::TAU;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Save,
        Restore,
        Translate(f64, f64),
        Rotate(f64),
        BeginPath,
        Arc(f64, f64),
        MoveTo(f64, f64),
        LineTo(f64, f64),
        ClosePath,
        Fill(String),
        Stroke(String, f64),
        Clip,
        Image(&'static str, f64, f64, f64, f64),
        Clear,
    }

    /// Records draw calls instead of drawing
    #[derive(Default)]
    struct Recorder {
        ops: Vec<Op>,
        fill: String,
        stroke: String,
        width: f64,
    }

    impl Canvas for Recorder {
        type Image = &'static str;

        fn save(&mut self) {
            self.ops.push(Op::Save);
        }
        fn restore(&mut self) {
            self.ops.push(Op::Restore);
        }
        fn translate(&mut self, x: f64, y: f64) {
            self.ops.push(Op::Translate(x, y));
        }
        fn rotate(&mut self, angle: f64) {
            self.ops.push(Op::Rotate(angle));
        }
        fn begin_path(&mut self) {
            self.ops.push(Op::BeginPath);
        }
        fn arc(&mut self, _x: f64, _y: f64, _radius: f64, start: f64, end: f64) {
            self.ops.push(Op::Arc(start, end));
        }
        fn move_to(&mut self, x: f64, y: f64) {
            self.ops.push(Op::MoveTo(x, y));
        }
        fn line_to(&mut self, x: f64, y: f64) {
            self.ops.push(Op::LineTo(x, y));
        }
        fn close_path(&mut self) {
            self.ops.push(Op::ClosePath);
        }
        fn set_fill_style(&mut self, color: &str) {
            self.fill = color.to_string();
        }
        fn fill(&mut self) {
            self.ops.push(Op::Fill(self.fill.clone()));
        }
        fn set_stroke_style(&mut self, color: &str) {
            self.stroke = color.to_string();
        }
        fn set_line_width(&mut self, width: f64) {
            self.width = width;
        }
        fn set_line_cap(&mut self, _cap: &str) {}
        fn stroke(&mut self) {
            self.ops.push(Op::Stroke(self.stroke.clone(), self.width));
        }
        fn clip(&mut self) {
            self.ops.push(Op::Clip);
        }
        fn draw_image(&mut self, image: &&'static str, x: f64, y: f64, w: f64, h: f64) {
            self.ops.push(Op::Image(*image, x, y, w, h));
        }
        fn clear_rect(&mut self, _x: f64, _y: f64, _w: f64, _h: f64) {
            self.ops.push(Op::Clear);
        }
    }

    fn one_fruit(level: usize) -> (CircleWorld, BodyTable) {
        let levels = LevelTable::standard();
        let mut world = CircleWorld::default();
        let mut table = BodyTable::new();
        table.spawn(
            &mut world,
            fruit_body(&levels, Material::default(), Vec2::new(10.0, 20.0), level, false).unwrap(),
        );
        (world, table)
    }

    #[test]
    fn test_flat_fruit_without_sprite() {
        let (world, table) = one_fruit(0);
        let assets: AssetRegistry<&'static str> = AssetRegistry::new(11);
        let mut canvas = Recorder::default();

        let drawn = render_bodies(&mut canvas, &world, &table, &assets, &Settings::default());
        assert_eq!(drawn, 1);
        assert_eq!(
            canvas.ops,
            vec![
                Op::Save,
                Op::Translate(10.0, 20.0),
                Op::Rotate(0.0),
                Op::BeginPath,
                Op::Arc(0.0, TAU),
                Op::Fill("#FFFACD".into()),
                Op::Stroke("#FFD700".into(), 2.0),
                Op::Restore,
            ]
        );
    }

    #[test]
    fn test_loaded_sprite_is_clipped_into_disc() {
        let (world, table) = one_fruit(1);
        let mut assets = AssetRegistry::new(11);
        assets.mark_loaded(1, "level_01");
        let mut canvas = Recorder::default();

        render_bodies(&mut canvas, &world, &table, &assets, &Settings::default());
        let n = canvas.ops.len();
        assert_eq!(canvas.ops[n - 3], Op::Clip);
        assert_eq!(canvas.ops[n - 2], Op::Image("level_01", -24.0, -24.0, 48.0, 48.0));
        assert_eq!(canvas.ops[n - 1], Op::Restore);

        // Sprites turned off keeps the flat fill
        let mut canvas = Recorder::default();
        let settings = Settings {
            sprites: false,
            ..Default::default()
        };
        render_bodies(&mut canvas, &world, &table, &assets, &settings);
        assert!(!canvas.ops.contains(&Op::Clip));
    }

    #[test]
    fn test_debris_draws_wedge() {
        let levels = LevelTable::standard();
        let mut world = CircleWorld::default();
        let mut table = BodyTable::new();
        let arc = SliceArc::new(0.5, 0.5 + std::f32::consts::PI);
        table.spawn(
            &mut world,
            debris_body(&levels, Material::default(), Vec2::ZERO, 0.0, 2, arc).unwrap(),
        );
        let assets: AssetRegistry<&'static str> = AssetRegistry::new(11);
        let mut canvas = Recorder::default();

        render_bodies(&mut canvas, &world, &table, &assets, &Settings::default());
        let path: Vec<&Op> = canvas
            .ops
            .iter()
            .skip_while(|op| **op != Op::BeginPath)
            .take(4)
            .collect();
        assert_eq!(path[1], &Op::MoveTo(0.0, 0.0));
        assert_eq!(path[2], &Op::Arc(0.5, (0.5 + std::f32::consts::PI) as f64));
        assert_eq!(path[3], &Op::ClosePath);
    }

    #[test]
    fn test_walls_are_not_drawn() {
        let mut world = CircleWorld::default();
        let mut table = BodyTable::new();
        crate::sim::state::spawn_walls(&mut world, &mut table, 400.0, 600.0, 60.0);
        let assets: AssetRegistry<&'static str> = AssetRegistry::new(11);
        let mut canvas = Recorder::default();
        assert_eq!(
            render_bodies(&mut canvas, &world, &table, &assets, &Settings::default()),
            0
        );
        assert!(canvas.ops.is_empty());
    }

    #[test]
    fn test_trail_polyline() {
        let mut canvas = Recorder::default();
        let settings = Settings::default();
        draw_trail(&mut canvas, [Vec2::ZERO], &settings);
        assert!(canvas.ops.is_empty(), "a single sample draws nothing");

        draw_trail(
            &mut canvas,
            [Vec2::ZERO, Vec2::new(5.0, 0.0), Vec2::new(10.0, 5.0)],
            &settings,
        );
        assert!(canvas.ops.contains(&Op::MoveTo(0.0, 0.0)));
        assert!(canvas.ops.contains(&Op::LineTo(10.0, 5.0)));
        assert!(canvas.ops.contains(&Op::Stroke("#ffffff".into(), 5.0)));
    }
}
