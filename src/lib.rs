//! Lifeboat: per-card colors and emphasis for kanban project boards.
//!
//! The metadata lives in a fenced `lifeboat` block inside each card's note,
//! so the board's own note editor is the only storage. The core is written
//! against [`host::Host`]; on `wasm32` the `web` module implements it over
//! the live page and exports `start` for the extension's loader.

pub mod app;
pub mod board;
pub mod config;
pub mod host;
pub mod render;
pub mod save;
pub mod watch;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use app::App;
pub use board::codec::{decode, encode, CodecError};
pub use board::{CardConfig, ColorOption};
pub use config::Settings;
