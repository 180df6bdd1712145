//! Utility modules shared by the server, build adapters and process handling.

pub mod exec;
pub mod mime;
pub mod path;
