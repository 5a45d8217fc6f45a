//! Courier turns website form submissions (messages, RSVPs and song
//! requests) into notification mails sent through an authenticated relay.

pub mod api;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod mail;
pub mod render;
pub mod submission;

pub use dispatch::Dispatcher;
pub use error::Error;
