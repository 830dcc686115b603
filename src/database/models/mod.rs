pub mod message;

pub use message::{Message, MessageChanges, NewMessage};
