pub mod host_store;
pub mod notifier;
pub mod prober;

pub use host_store::{HostStore, StoreError};
pub use notifier::{Notifier, NotifyError};
pub use prober::Prober;
