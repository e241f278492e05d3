//! Access descriptors: where the bytes of a resource currently live.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::constants::{LOCAL_OCI_BLOB_TYPE, OCI_BLOB_TYPE, OCI_REGISTRY_TYPE};

/// Blob stored next to the component descriptor in its own repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalOciBlobAccess {
    pub digest: String,
}

/// Blob stored in a remote content-addressed store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OciBlobAccess {
    pub reference: String,
    pub media_type: String,
    pub digest: String,
    pub size: u64,
}

/// Image addressed by reference in an OCI registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OciRegistryAccess {
    pub image_reference: String,
}

/// Access descriptor of a resource, tagged by its `type` field.
///
/// Types this crate does not know are kept verbatim in [`Access::Other`] so
/// they survive a round trip through the message codec; stages reject them
/// as unsupported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum Access {
    LocalOciBlob(LocalOciBlobAccess),
    OciBlob(OciBlobAccess),
    OciRegistry(OciRegistryAccess),
    Other {
        access_type: String,
        fields: Map<String, Value>,
    },
}

impl Access {
    pub fn local_blob(digest: impl Into<String>) -> Self {
        Self::LocalOciBlob(LocalOciBlobAccess {
            digest: digest.into(),
        })
    }

    pub fn type_name(&self) -> &str {
        match self {
            Self::LocalOciBlob(_) => LOCAL_OCI_BLOB_TYPE,
            Self::OciBlob(_) => OCI_BLOB_TYPE,
            Self::OciRegistry(_) => OCI_REGISTRY_TYPE,
            Self::Other { access_type, .. } => access_type,
        }
    }
}

impl TryFrom<Value> for Access {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(mut fields) = value else {
            return Err("access must be an object".to_string());
        };
        let access_type = match fields.remove("type") {
            Some(Value::String(access_type)) => access_type,
            _ => return Err("access is missing a string 'type' field".to_string()),
        };

        let parsed = if access_type == LOCAL_OCI_BLOB_TYPE {
            serde_json::from_value(Value::Object(fields)).map(Self::LocalOciBlob)
        } else if access_type == OCI_BLOB_TYPE {
            serde_json::from_value(Value::Object(fields)).map(Self::OciBlob)
        } else if access_type == OCI_REGISTRY_TYPE {
            serde_json::from_value(Value::Object(fields)).map(Self::OciRegistry)
        } else {
            return Ok(Self::Other {
                access_type,
                fields,
            });
        };

        parsed.map_err(|e| format!("invalid {access_type} access: {e}"))
    }
}

impl From<Access> for Value {
    fn from(access: Access) -> Self {
        let (access_type, body) = match access {
            Access::LocalOciBlob(a) => (LOCAL_OCI_BLOB_TYPE.to_string(), serde_json::to_value(a)),
            Access::OciBlob(a) => (OCI_BLOB_TYPE.to_string(), serde_json::to_value(a)),
            Access::OciRegistry(a) => (OCI_REGISTRY_TYPE.to_string(), serde_json::to_value(a)),
            Access::Other {
                access_type,
                fields,
            } => (access_type, Ok(Value::Object(fields))),
        };

        // Plain string/integer structs always serialize to an object
        let mut fields = match body {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        fields.insert("type".to_string(), Value::String(access_type));
        Value::Object(fields)
    }
}
