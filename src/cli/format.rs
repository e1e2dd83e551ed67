//! Output formatting for CLI display.

use crate::model::{CommandGroup, DrawCommand};

/// Format a command as one human-readable line.
pub(super) fn format_command(command: &DrawCommand) -> String {
    match command {
        DrawCommand::Circle {
            x,
            y,
            radius,
            color,
        } => format!("circle  at ({x}, {y}) r={radius} {color}"),
        DrawCommand::Line {
            from,
            to,
            width,
            color,
        } => format!(
            "line    ({}, {}) → ({}, {}) w={width} {color}",
            from.x, from.y, to.x, to.y
        ),
        DrawCommand::Rect {
            x,
            y,
            width,
            height,
            color,
        } => format!("rect    at ({x}, {y}) {width}x{height} {color}"),
    }
}

/// Format a saved group as a one-line summary: first prompt line and size.
pub(super) fn format_group_summary(group: &CommandGroup) -> String {
    let first = group.prompt.lines().next().unwrap_or("");
    let more = if group.prompt.lines().count() > 1 {
        " …"
    } else {
        ""
    };
    let n = group.commands.len();
    let noun = if n == 1 { "command" } else { "commands" };
    format!("{first}{more}  ({n} {noun})")
}

pub(super) fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}
