#![warn(clippy::pedantic)]

pub mod assets;
pub mod editor;
pub mod gizmos;
pub mod global;
pub mod pen_tools;
pub mod pointer_events;
pub mod renderer;
pub mod upload;
pub mod view_transform;

pub use editor::Editor;
