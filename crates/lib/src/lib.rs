//! TránsitoBot core library: message model, chat API client, reply normalization,
//! offline responder, and conversation state shared by the CLI and desktop applications.

pub mod api;
pub mod config;
pub mod conversation;
pub mod fallback;
pub mod init;
pub mod message;
pub mod normalize;
pub mod session;
pub mod suggestions;
pub mod transcript;
