use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user record, owned by an external identity system.
///
/// The core only ever reads users; `email` feeds notification payloads.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub uuid: Uuid,
    pub document: String,
    pub email: String,
}
