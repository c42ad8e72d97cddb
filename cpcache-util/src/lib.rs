#![warn(clippy::all)]

pub mod console;
pub mod error;
mod macros;
pub mod model;

pub use console::Console;
pub use error::{FetchError, Stage, StageFailure};

pub type Error = anyhow::Error;
pub type Result<T> = anyhow::Result<T>;
