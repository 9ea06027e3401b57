pub mod poller;
pub mod registry;

pub use poller::{Poller, RoundReport};
pub use registry::{Registry, RegistryError, ReloadOutcome};
