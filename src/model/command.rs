//! Drawing commands: the closed set of primitives a canvas understands.

use serde::{Deserialize, Serialize};

/// Fill or stroke color used when a command does not name one.
pub const DEFAULT_COLOR: &str = "black";

/// Stroke width used when a line does not specify one.
pub const DEFAULT_LINE_WIDTH: f64 = 2.0;

/// A position on the canvas, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A single drawing primitive.
///
/// Tagged on `type` so each element of a batch is self-describing.
/// Deserialization goes through [`WireCommand`], which fills optional
/// fields with their defaults; once a `DrawCommand` exists, every field
/// is populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", from = "WireCommand")]
pub enum DrawCommand {
    /// Filled disc centered at (`x`, `y`).
    Circle {
        x: f64,
        y: f64,
        radius: f64,
        color: String,
    },

    /// Stroked segment from `from` to `to`.
    Line {
        from: Point,
        to: Point,
        width: f64,
        color: String,
    },

    /// Filled axis-aligned rectangle with its origin at (`x`, `y`).
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        color: String,
    },
}

impl DrawCommand {
    /// The command's tag as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Circle { .. } => "circle",
            Self::Line { .. } => "line",
            Self::Rect { .. } => "rect",
        }
    }

    /// The fill or stroke color.
    pub fn color(&self) -> &str {
        match self {
            Self::Circle { color, .. } | Self::Line { color, .. } | Self::Rect { color, .. } => {
                color
            }
        }
    }
}

/// Untrusted shape of a command: required fields typed, optional fields open.
///
/// A `null` or empty color and a `null` or zero width count as absent.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum WireCommand {
    Circle {
        x: f64,
        y: f64,
        radius: f64,
        #[serde(default)]
        color: Option<String>,
    },
    Line {
        from: Point,
        to: Point,
        #[serde(default)]
        width: Option<f64>,
        #[serde(default)]
        color: Option<String>,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        #[serde(default)]
        color: Option<String>,
    },
}

impl From<WireCommand> for DrawCommand {
    fn from(wire: WireCommand) -> Self {
        match wire {
            WireCommand::Circle {
                x,
                y,
                radius,
                color,
            } => Self::Circle {
                x,
                y,
                radius,
                color: color_or_default(color),
            },
            WireCommand::Line {
                from,
                to,
                width,
                color,
            } => Self::Line {
                from,
                to,
                width: width
                    .filter(|w| w.abs() > f64::EPSILON)
                    .unwrap_or(DEFAULT_LINE_WIDTH),
                color: color_or_default(color),
            },
            WireCommand::Rect {
                x,
                y,
                width,
                height,
                color,
            } => Self::Rect {
                x,
                y,
                width,
                height,
                color: color_or_default(color),
            },
        }
    }
}

fn color_or_default(color: Option<String>) -> String {
    color
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_COLOR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn circle_color_defaults_to_black() {
        let cmd: DrawCommand =
            serde_json::from_value(json!({"type": "circle", "x": 1, "y": 2, "radius": 3}))
                .unwrap();
        assert_eq!(
            cmd,
            DrawCommand::Circle {
                x: 1.0,
                y: 2.0,
                radius: 3.0,
                color: "black".into(),
            }
        );
    }

    #[test]
    fn line_width_defaults_when_missing_null_or_zero() {
        for width in [json!(null), json!(0)] {
            let cmd: DrawCommand = serde_json::from_value(json!({
                "type": "line",
                "from": {"x": 0, "y": 0},
                "to": {"x": 5, "y": 5},
                "width": width,
            }))
            .unwrap();
            assert!(matches!(cmd, DrawCommand::Line { width, .. } if width == DEFAULT_LINE_WIDTH));
        }

        let cmd: DrawCommand = serde_json::from_value(json!({
            "type": "line",
            "from": {"x": 0, "y": 0},
            "to": {"x": 5, "y": 5},
        }))
        .unwrap();
        assert!(matches!(cmd, DrawCommand::Line { width, .. } if width == DEFAULT_LINE_WIDTH));
    }

    #[test]
    fn empty_color_counts_as_absent() {
        let cmd: DrawCommand = serde_json::from_value(
            json!({"type": "rect", "x": 0, "y": 0, "width": 1, "height": 1, "color": ""}),
        )
        .unwrap();
        assert_eq!(cmd.color(), "black");
    }

    #[test]
    fn explicit_fields_are_kept() {
        let cmd: DrawCommand = serde_json::from_value(json!({
            "type": "line",
            "from": {"x": 1, "y": 2},
            "to": {"x": 3, "y": 4},
            "width": 7.5,
            "color": "red",
        }))
        .unwrap();
        assert_eq!(
            cmd,
            DrawCommand::Line {
                from: Point { x: 1.0, y: 2.0 },
                to: Point { x: 3.0, y: 4.0 },
                width: 7.5,
                color: "red".into(),
            }
        );
    }

    #[test]
    fn unknown_tag_and_missing_fields_are_rejected() {
        assert!(serde_json::from_value::<DrawCommand>(json!({"type": "triangle"})).is_err());
        assert!(serde_json::from_value::<DrawCommand>(json!({"x": 1, "y": 1})).is_err());
        assert!(serde_json::from_value::<DrawCommand>(json!({"type": "circle", "x": 1})).is_err());
        assert!(
            serde_json::from_value::<DrawCommand>(
                json!({"type": "circle", "x": "1", "y": 2, "radius": 3})
            )
            .is_err()
        );
    }

    #[test]
    fn serializes_with_type_tag_and_all_fields() {
        let cmd = DrawCommand::Rect {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
            color: "black".into(),
        };
        let value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(value["type"], "rect");
        assert_eq!(value["color"], "black");
        assert_eq!(value["width"], 10.0);
    }
}
