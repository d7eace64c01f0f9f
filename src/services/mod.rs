pub mod bulk_loader;
pub mod chat_store;
pub mod identity;
pub mod message_log;
pub mod messenger;
pub mod user_directory;
