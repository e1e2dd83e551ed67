//! Render interpreter: replays commands onto a drawing surface.
//!
//! Rendering is a pure function of the surface size and the command
//! sequence. The surface is always cleared first, then commands paint in
//! order, later ones on top. Commands that cannot be drawn (non-finite
//! coordinates, non-positive radius or line width) are skipped; rendering
//! never fails.

mod color;
mod pixmap;

use serde::Deserialize as _;
use serde_json::Value;
use tracing::debug;

use crate::model::{DrawCommand, Point};

pub use color::Color;
pub use pixmap::{MAX_DIMENSION, Pixmap};

/// Something commands can be drawn on.
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Resets every pixel to the blank state.
    fn clear(&mut self);

    fn fill_circle(&mut self, center: Point, radius: f64, color: Color);
    fn stroke_line(&mut self, from: Point, to: Point, width: f64, color: Color);

    /// Fills the rectangle spanning `origin` to `origin + (width, height)`.
    /// Negative extents grow left or up.
    fn fill_rect(&mut self, origin: Point, width: f64, height: f64, color: Color);
}

/// Clears the surface and draws each command in sequence.
pub fn render(surface: &mut impl Surface, commands: &[DrawCommand]) {
    surface.clear();
    for command in commands {
        draw(surface, command);
    }
}

/// Like [`render`], but over untyped JSON elements.
///
/// Each element is decoded on its own; anything that is not a command is
/// skipped.
pub fn render_values(surface: &mut impl Surface, values: &[Value]) {
    surface.clear();
    for (index, value) in values.iter().enumerate() {
        match DrawCommand::deserialize(value) {
            Ok(command) => draw(surface, &command),
            Err(e) => debug!(index, error = %e, "skipping undrawable element"),
        }
    }
}

fn draw(surface: &mut impl Surface, command: &DrawCommand) {
    let color = Color::parse_or_black(command.color());
    match *command {
        DrawCommand::Circle { x, y, radius, .. } => {
            if finite(&[x, y, radius]) && radius > 0.0 {
                surface.fill_circle(Point { x, y }, radius, color);
                return;
            }
        }
        DrawCommand::Line {
            from, to, width, ..
        } => {
            if finite(&[from.x, from.y, to.x, to.y, width]) && width > 0.0 {
                surface.stroke_line(from, to, width, color);
                return;
            }
        }
        DrawCommand::Rect {
            x,
            y,
            width,
            height,
            ..
        } => {
            if finite(&[x, y, width, height]) {
                surface.fill_rect(Point { x, y }, width, height, color);
                return;
            }
        }
    }
    debug!(kind = command.kind(), "skipping command with unusable geometry");
}

fn finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::validate::validate_batch;

    /// Records calls instead of painting.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl Surface for Recorder {
        fn width(&self) -> u32 {
            100
        }

        fn height(&self) -> u32 {
            100
        }

        fn clear(&mut self) {
            self.calls.push("clear".into());
        }

        fn fill_circle(&mut self, center: Point, radius: f64, _color: Color) {
            self.calls
                .push(format!("circle {} {} {radius}", center.x, center.y));
        }

        fn stroke_line(&mut self, from: Point, to: Point, width: f64, _color: Color) {
            self.calls.push(format!(
                "line {} {} {} {} {width}",
                from.x, from.y, to.x, to.y
            ));
        }

        fn fill_rect(&mut self, origin: Point, width: f64, height: f64, _color: Color) {
            self.calls
                .push(format!("rect {} {} {width} {height}", origin.x, origin.y));
        }
    }

    #[test]
    fn empty_list_only_clears() {
        let mut recorder = Recorder::default();
        render(&mut recorder, &[]);
        assert_eq!(recorder.calls, vec!["clear"]);

        let mut pixmap = Pixmap::new(10, 10).unwrap();
        pixmap.fill_rect(Point { x: 0.0, y: 0.0 }, 10.0, 10.0, Color::BLACK);
        render(&mut pixmap, &[]);
        assert_eq!(pixmap, Pixmap::new(10, 10).unwrap());
    }

    #[test]
    fn paints_in_sequence_order() {
        let commands = validate_batch(
            r#"[{"type":"rect","x":0,"y":0,"width":10,"height":10},
                {"type":"circle","x":5,"y":5,"radius":2}]"#,
        )
        .unwrap();

        let mut recorder = Recorder::default();
        render(&mut recorder, &commands);
        assert_eq!(
            recorder.calls,
            vec!["clear", "rect 0 0 10 10", "circle 5 5 2"]
        );
    }

    #[test]
    fn later_commands_draw_on_top() {
        let commands = validate_batch(
            r#"[{"type":"rect","x":0,"y":0,"width":10,"height":10,"color":"red"},
                {"type":"circle","x":5,"y":5,"radius":2,"color":"blue"}]"#,
        )
        .unwrap();

        let mut pixmap = Pixmap::new(10, 10).unwrap();
        render(&mut pixmap, &commands);
        assert_eq!(pixmap.pixel(5, 5), Some(Color::rgb(0, 0, 255)));
        assert_eq!(pixmap.pixel(0, 0), Some(Color::rgb(255, 0, 0)));
    }

    #[test]
    fn rendering_is_deterministic() {
        let commands = validate_batch(
            r##"[
                {"type":"line","from":{"x":1,"y":1},"to":{"x":40,"y":25},"width":3,
                 "color":"#336699"},
                {"type":"circle","x":20,"y":12,"radius":7.5,"color":"rgba(255,0,0,0.5)"}
            ]"##,
        )
        .unwrap();

        let mut first = Pixmap::new(48, 32).unwrap();
        render(&mut first, &commands);

        // Dirty surface: render must not depend on what was there.
        let mut second = Pixmap::new(48, 32).unwrap();
        second.fill_rect(Point { x: 0.0, y: 0.0 }, 48.0, 32.0, Color::rgb(1, 2, 3));
        render(&mut second, &commands);

        assert_eq!(first, second);
    }

    #[test]
    fn undrawable_geometry_is_skipped() {
        let commands = vec![
            DrawCommand::Circle {
                x: f64::NAN,
                y: 0.0,
                radius: 3.0,
                color: "black".into(),
            },
            DrawCommand::Circle {
                x: 1.0,
                y: 1.0,
                radius: -1.0,
                color: "black".into(),
            },
            DrawCommand::Line {
                from: Point { x: 0.0, y: 0.0 },
                to: Point { x: 1.0, y: 1.0 },
                width: -2.0,
                color: "black".into(),
            },
            DrawCommand::Rect {
                x: 0.0,
                y: f64::INFINITY,
                width: 1.0,
                height: 1.0,
                color: "black".into(),
            },
            DrawCommand::Rect {
                x: 1.0,
                y: 2.0,
                width: 3.0,
                height: 4.0,
                color: "black".into(),
            },
        ];

        let mut recorder = Recorder::default();
        render(&mut recorder, &commands);
        assert_eq!(recorder.calls, vec!["clear", "rect 1 2 3 4"]);
    }

    #[test]
    fn untyped_elements_are_skipped() {
        let values = vec![
            json!({"type": "line", "from": {"x": 0, "y": 0}, "to": {"x": 3, "y": 0}}),
            json!({"x": 1, "y": 1, "radius": 1}),
            json!({"type": ""}),
            json!({"type": "spiral"}),
            json!(null),
            json!({"type": "circle", "x": 2, "y": 2, "radius": 1}),
        ];

        let mut recorder = Recorder::default();
        render_values(&mut recorder, &values);
        assert_eq!(
            recorder.calls,
            vec!["clear", "line 0 0 3 0 2", "circle 2 2 1"]
        );
    }
}
