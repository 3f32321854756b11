//! `colab-client`: blocking SDK for the hosted Claude Colab service.
//!
//! A bot connects with its API key (explicit, from the environment, or vended
//! from the local keystore), picks a project, and then polls
//! [`ColabClient::heartbeat`] to learn whether anyone needs it.
//!
//! ```text
//! ConnectOptions ──► resolve_api_key ──► rpc/validate_api_key ──► Session
//!                                                                   │
//!            heartbeat / chat / tasks / knowledge / projects ◄──────┘
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use colab_client::{ColabClient, ConnectOptions, HeartbeatOptions};
//! use colab_core::config::ServiceConfig;
//!
//! let service = ServiceConfig::resolve(&home)?;
//! let mut colab = ColabClient::new(service)?.with_home(&home);
//! colab.connect(ConnectOptions::named("BOT1"))?;
//! colab.set_project("claude-colab")?;
//!
//! let beat = colab.heartbeat(&HeartbeatOptions::default())?;
//! if beat.has_work {
//!     for m in colab.get_mentions(20)? {
//!         println!("{}: {}", m.author.unwrap_or_default(), m.message);
//!     }
//! }
//! ```

pub mod chat;
pub mod client;
pub mod error;
pub mod knowledge;
pub mod presence;
pub mod project;
pub mod tasks;
pub mod types;


pub use client::{resolve_api_key, ColabClient, ENV_API_KEY};
pub use error::ClientError;
pub use types::*;

pub type Result<T> = std::result::Result<T, ClientError>;
