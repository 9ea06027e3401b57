pub mod history;
pub mod host;
pub mod outcome;
pub mod policy;

pub use history::{HistoryBuffer, Sample};
pub use host::{HistoryView, HostRecord, HostSet, HostSettings, HostView, MonitoredHost};
pub use outcome::{Outcome, SlotOutcome};
pub use policy::{Notification, NotificationKind, NotificationPolicy, PolicyState};
