pub mod config;
pub mod logger;
pub mod setup;

pub use config::*;
pub use logger::*;
pub use setup::*;
