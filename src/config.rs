//! Configuration module for rove.
//!
//! - [general]: behavior flags ([Settings]) and their `set` parsing.
//! - [input]: the `[keys]` table and the editor command.
//! - [load]: reading `rove.toml` into a [Config] and generating the default file.

pub mod general;
pub mod input;
pub mod load;

pub use general::{General, Settings};
pub use input::{Editor, Keys};
pub use load::{Config, RawConfig};
