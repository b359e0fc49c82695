//! Notifications pushed through the websockets server

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;
use crate::envelope::encode_payload;
use crate::invoker::{Call, FailoverInvoker};

/// Registry name of the websockets server
pub const SERVICE: &str = "Brain-Websockets-Server";

const SEND: Call<'static> = Call::post(SERVICE, "/notifications/send");

/// Notification kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationEvent {
    /// Informational
    #[default]
    Info,
    /// Something needs attention
    Warning,
    /// An operation failed
    Error,
}

/// Notification delivered to a user's websocket clients
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Notification {
    /// Kind
    #[serde(rename = "Event", default)]
    pub event: NotificationEvent,
    /// Free-form payload
    #[serde(rename = "Payload", default)]
    pub payload: Value,
}

impl Notification {
    /// Notification with the given payload
    pub fn new(event: NotificationEvent, payload: impl Into<Value>) -> Self {
        Self {
            event,
            payload: payload.into(),
        }
    }
}

/// Send a notification through the first websockets server that accepts it
pub async fn send_notification(
    invoker: &FailoverInvoker,
    notification: &Notification,
) -> Result<()> {
    let body = encode_payload(notification)?;
    invoker
        .invoke::<Value>(&SEND, Some(body))
        .await?
        .into_result()?;
    Ok(())
}

/// Send a notification as an info notification, whatever its event was
pub async fn send_info_notification(
    invoker: &FailoverInvoker,
    mut notification: Notification,
) -> Result<()> {
    notification.event = NotificationEvent::Info;
    send_notification(invoker, &notification).await
}
