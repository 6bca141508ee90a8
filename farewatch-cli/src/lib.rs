pub mod cli;
pub mod commands;
pub mod error;
pub mod render;
pub mod state;

pub use cli::{Cli, Command};
pub use error::AppError;
pub use state::AppState;
