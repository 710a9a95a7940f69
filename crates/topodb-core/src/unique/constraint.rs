//! Unique-constraint records and request payloads.

use rkyv::{Archive, Deserialize, Serialize};

use crate::error::Error;

/// A stored unique-constraint definition.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize, serde::Serialize)]
pub struct UniqueConstraint {
    /// Constraint id, assigned by the store on creation. Immutable.
    pub id: u64,
    /// Object type this constraint applies to. Immutable.
    pub object_id: String,
    /// Property ids that must be jointly unique.
    pub keys: Vec<String>,
    /// Whether the constraint is enforced strictly at instance-write time.
    pub must_check: bool,
}

impl UniqueConstraint {
    /// Serialize to bytes for storage.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|v| v.to_vec())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize from stored bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(bytes)
            .map_err(|e| Error::Deserialization(e.to_string()))
    }
}

/// Request payload for creating a unique constraint.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CreateUniqueRequest {
    /// Property ids that must be jointly unique.
    pub keys: Vec<String>,
    /// Whether the constraint is enforced strictly. Defaults to true.
    #[serde(default = "default_must_check")]
    pub must_check: bool,
}

/// Request payload for updating a unique constraint.
///
/// Only `keys` and `must_check` are updatable; id and object type are fixed
/// at creation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct UpdateUniqueRequest {
    /// Replacement property ids.
    pub keys: Vec<String>,
    /// Replacement must-check flag.
    #[serde(default = "default_must_check")]
    pub must_check: bool,
}

fn default_must_check() -> bool {
    true
}

/// Validate a constraint key set: non-empty, no blank ids, no duplicates.
pub(crate) fn validate_keys(keys: &[String]) -> Result<(), Error> {
    if keys.is_empty() {
        return Err(Error::InvalidArgument(
            "unique constraint requires at least one key".to_string(),
        ));
    }
    for (i, key) in keys.iter().enumerate() {
        if key.is_empty() {
            return Err(Error::InvalidArgument("empty constraint key".to_string()));
        }
        if keys[..i].contains(key) {
            return Err(Error::InvalidArgument(format!(
                "duplicate constraint key '{key}'"
            )));
        }
    }
    Ok(())
}

impl CreateUniqueRequest {
    /// Create a request from a list of keys, with strict checking enabled.
    pub fn new(keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            must_check: true,
        }
    }

    /// Disable strict instance-write checking.
    pub fn advisory(mut self) -> Self {
        self.must_check = false;
        self
    }

    /// Validate the request payload.
    pub fn validate(&self) -> Result<(), Error> {
        validate_keys(&self.keys)
    }
}

impl UpdateUniqueRequest {
    /// Create a request from a list of replacement keys.
    pub fn new(keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            must_check: true,
        }
    }

    /// Validate the request payload.
    pub fn validate(&self) -> Result<(), Error> {
        validate_keys(&self.keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_roundtrip() {
        let constraint = UniqueConstraint {
            id: 7,
            object_id: "host".to_string(),
            keys: vec!["ip".to_string(), "cloud_id".to_string()],
            must_check: true,
        };

        let bytes = constraint.to_bytes().unwrap();
        let decoded = UniqueConstraint::from_bytes(&bytes).unwrap();
        assert_eq!(constraint, decoded);
    }

    #[test]
    fn test_validate_empty_keys() {
        let request = CreateUniqueRequest::new(Vec::<String>::new());
        assert!(matches!(
            request.validate(),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_validate_duplicate_keys() {
        let request = UpdateUniqueRequest::new(["ip", "ip"]);
        assert!(matches!(
            request.validate(),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_validate_blank_key() {
        let request = CreateUniqueRequest::new(["ip", ""]);
        assert!(matches!(
            request.validate(),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_request_deserialization_defaults() {
        let request: CreateUniqueRequest =
            serde_json::from_str(r#"{"keys":["ip"]}"#).unwrap();
        assert!(request.must_check);
        assert_eq!(request.keys, vec!["ip"]);
    }
}
