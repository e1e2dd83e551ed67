//! Core data model for drawbot.
//!
//! These types represent what moves through the system:
//! drawing commands, the groups a prompt produces, and the
//! stored drawing records the gateway persists.

mod command;
mod drawing;
mod group;

pub use command::{DrawCommand, Point};
pub use drawing::Drawing;
pub use group::CommandGroup;
