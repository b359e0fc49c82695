//! Cached dictionaries held by the octopus service
//!
//! Every octopus instance keeps its own copy of a user's dictionary, so both
//! operations are broadcast to all instances rather than stopping at the
//! first one that answers.

use serde_json::Value;

use crate::Result;
use crate::invoker::{BroadcastReport, Call, FailoverInvoker};

/// Registry name of the octopus service
pub const SERVICE: &str = "Brain-Octopus-Service";

const REMOVE_DICT: Call<'static> = Call::get(SERVICE, "/dict/remove");
const UPDATE_DICT: Call<'static> = Call::get(SERVICE, "/dict/update");

/// Drop the caller's dictionary from every octopus instance's cache
///
/// Succeeds if at least one instance acknowledged.
pub async fn remove_dict(invoker: &FailoverInvoker) -> Result<BroadcastReport<Value>> {
    invoker.broadcast(&REMOVE_DICT, None).await?.into_result()
}

/// Rebuild the caller's dictionary on every octopus instance
///
/// Succeeds if at least one instance acknowledged.
pub async fn update_dict(invoker: &FailoverInvoker) -> Result<BroadcastReport<Value>> {
    invoker.broadcast(&UPDATE_DICT, None).await?.into_result()
}
