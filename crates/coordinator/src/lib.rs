//! Support session coordinator.
//!
//! Owns the session lifecycle on top of the store:
//! - Sessions (create, update, soft delete, listing with the admin view)
//! - Message log (append, history, read receipts)
//! - Assignment policy (least-loaded agent under capacity)
//! - Transfer workflow (request, accept, reject, cancel)
//! - Background work (idle-session reaper, backlog alerts)

pub mod assignment;
pub mod coordinator;
pub mod messages;
pub mod notify;
pub mod reaper;
pub mod scheduler;
pub mod sessions;
pub mod settings;
pub mod transfers;
pub mod views;

mod ops;

pub use coordinator::Coordinator;
pub use notify::{LogNotifier, Notification, NotificationDispatcher, Notifier, NotifyError};
pub use scheduler::{Scheduler, SchedulerConfig};
pub use views::*;
