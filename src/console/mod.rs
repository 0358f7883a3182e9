//! Console front end: command parsing and list rendering.

pub mod command;
pub mod view;

pub use command::{Command, CommandError};
pub use view::render;
