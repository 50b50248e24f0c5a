// JSON document store served over a length-prefixed TCP protocol
//
// The whole database is one JSON object in one file. Keys are either a
// top-level field name or a path of field names into nested objects.

pub mod async_wrapper;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod document;
pub mod errors;
pub mod gate;
pub mod outcome;
pub mod path_key;
pub mod protocol;
pub mod server;
pub mod store;

pub use async_wrapper::AsyncStore;
pub use config::{ClientConfig, ServerConfig};
pub use dispatcher::Dispatcher;
pub use document::Document;
pub use errors::{JsonDbError, Result};
pub use outcome::{Outcome, Response, Status};
pub use path_key::PathKey;
pub use protocol::Operation;
pub use server::{Server, Shutdown};
pub use store::Store;
