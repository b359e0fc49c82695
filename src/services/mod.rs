//! Callers for platform services
//!
//! Each caller binds a fixed service name, path and method to the
//! [`FailoverInvoker`](crate::invoker::FailoverInvoker) and types the payload.

pub mod datastores;
pub mod octopus;
pub mod websockets;

pub use datastores::Datastore;
pub use websockets::{Notification, NotificationEvent};
