//! Template rendering.

pub mod engine;

pub use engine::{ThemeEngine, format_money};
