pub mod backend;
pub mod cancel;
pub mod cli;
pub mod config;
pub mod design;
pub mod error;
pub mod formatter;
pub mod history;
pub mod http;
pub mod poller;
pub mod search;
pub mod session;
pub mod workflow;

pub use sketchseek_common::protocol;
