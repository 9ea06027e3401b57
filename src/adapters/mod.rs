pub mod http;
pub mod notify;
pub mod store;

pub use http::HttpProber;
pub use notify::{LogNotifier, WebhookNotifier};
pub use store::{JsonFileStore, MemoryStore};
