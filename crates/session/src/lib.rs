mod assistant;
mod autosave;
mod config;
mod error;
mod mention;
mod service;
mod session;

pub use crate::assistant::*;
pub use crate::autosave::Autosaver;
pub use crate::config::*;
pub use crate::error::*;
pub use crate::mention::MentionSearch;
pub use crate::service::*;
pub use crate::session::*;
