pub mod bot;
pub mod config;
pub mod error;
pub mod io;
pub mod keystore;
pub mod paths;

pub use error::{ColabError, Result};
