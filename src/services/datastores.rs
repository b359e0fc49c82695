//! Datastore records held by the data-integration service

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::envelope::encode_payload;
use crate::invoker::{Call, FailoverInvoker};

/// Registry name of the data-integration service
pub const SERVICE: &str = "Brain-Data-Integeration-Service";

const LIST: Call<'static> = Call::get(SERVICE, "/services/datastore/list");
const GET: Call<'static> = Call::post(SERVICE, "/services/datastore/get");
const CREATE: Call<'static> = Call::post(SERVICE, "/services/datastore/create");

/// A datastore record
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Datastore {
    /// Record id
    #[serde(rename = "ID")]
    pub id: u64,
    /// Creation timestamp (RFC 3339)
    #[serde(rename = "CreatedAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Last update timestamp (RFC 3339)
    #[serde(rename = "UpdatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Display name
    #[serde(rename = "Name")]
    pub name: String,
    /// Host or connection URL
    #[serde(rename = "URL")]
    pub url: String,
    /// Port
    #[serde(rename = "Port")]
    pub port: u16,
    /// Login user
    #[serde(rename = "Username")]
    pub username: String,
    /// Login password
    #[serde(rename = "Password")]
    pub password: String,
    /// Engine name (postgres, mysql, ...)
    #[serde(rename = "Datastore")]
    pub datastore: String,
}

impl Datastore {
    /// Record carrying only an id, as sent to `/services/datastore/get`
    #[must_use]
    pub fn with_id(id: u64) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }
}

/// List the datastores available in the platform
///
/// `Data: null` from the service is an empty list.
pub async fn list_datastores(invoker: &FailoverInvoker) -> Result<Vec<Datastore>> {
    let envelope = invoker
        .invoke::<Vec<Datastore>>(&LIST, None)
        .await?
        .into_result()?;
    Ok(envelope.into_data().unwrap_or_default())
}

/// Fetch one datastore by id
pub async fn get_datastore(invoker: &FailoverInvoker, id: u64) -> Result<Option<Datastore>> {
    let body = encode_payload(&Datastore::with_id(id))?;
    let envelope = invoker
        .invoke::<Datastore>(&GET, Some(body))
        .await?
        .into_result()?;
    Ok(envelope.into_data())
}

/// Create a datastore and return the stored record
pub async fn create_datastore(
    invoker: &FailoverInvoker,
    datastore: &Datastore,
) -> Result<Option<Datastore>> {
    let body = encode_payload(datastore)?;
    let envelope = invoker
        .invoke::<Datastore>(&CREATE, Some(body))
        .await?
        .into_result()?;
    Ok(envelope.into_data())
}
