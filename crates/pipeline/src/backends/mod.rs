//! Speech model backends
//!
//! - `remote`: OpenAI-compatible speech server over HTTP
//! - `simple`: in-process tone generator for development and tests

pub mod remote;
pub mod simple;

pub use remote::{RemoteConfig, RemoteLoader, RemoteModel};
pub use simple::{SimpleLoader, SimpleModel};
