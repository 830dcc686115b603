// handlers/mod.rs - HTTP handlers
//
// messages/collection.rs  GET, POST    /messages
// messages/record.rs      GET, PATCH, DELETE  /messages/:id
pub mod messages;
pub mod service;

pub use messages::*;
