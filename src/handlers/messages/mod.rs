pub mod collection;
pub mod payload;
pub mod record;

// Re-export handler functions for use in routing
pub use collection::get as messages_get;
pub use collection::post as messages_post;

pub use record::delete as message_delete;
pub use record::get as message_get;
pub use record::patch as message_patch;
