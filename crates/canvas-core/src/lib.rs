pub mod config;
pub mod conversation;

pub use config::*;
pub use conversation::Conversation;
