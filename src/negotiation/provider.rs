//! Entity providers: units that read and/or write a value for one or more
//! MIME types.

use crate::error::ServiceError;
use crate::message::Request;
use serde_json::Value;

/// A unit capable of reading and/or writing entity bodies for the MIME
/// types it declares.
///
/// Reading and writing are registered independently: a provider declaring
/// only `produces` types is write-only. The `can_read`/`can_write`
/// predicates let several providers share one MIME type (for example a
/// provider that only renders values tagged for a named template); within a
/// bucket the first provider whose predicate accepts wins, so more specific
/// providers must be registered before general ones.
pub trait Provider: Send + Sync {
    /// MIME types this provider reads. Empty for write-only providers.
    fn consumes(&self) -> &[&str] {
        &[]
    }

    /// MIME types this provider writes. Empty for read-only providers.
    fn produces(&self) -> &[&str] {
        &[]
    }

    /// Structural applicability for reading the given request.
    fn can_read(&self, _req: &Request) -> bool {
        true
    }

    /// Deserialize a request body.
    fn read(&self, body: &[u8]) -> Result<Value, ServiceError>;

    /// Structural applicability for writing the given value.
    fn can_write(&self, _value: &Value) -> bool {
        true
    }

    /// Serialize a response value.
    fn write(&self, value: &Value) -> Result<Vec<u8>, ServiceError>;
}

/// JSON entity provider backed by `serde_json`.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonProvider;

impl Provider for JsonProvider {
    fn consumes(&self) -> &[&str] {
        &["application/json"]
    }

    fn produces(&self) -> &[&str] {
        &["application/json"]
    }

    fn read(&self, body: &[u8]) -> Result<Value, ServiceError> {
        serde_json::from_slice(body).map_err(|e| ServiceError::Validation {
            status: 400,
            message: format!("malformed JSON body: {e}"),
        })
    }

    fn write(&self, value: &Value) -> Result<Vec<u8>, ServiceError> {
        serde_json::to_vec(value).map_err(|e| ServiceError::Internal {
            message: format!("JSON serialization failed: {e}"),
        })
    }
}

/// YAML entity provider backed by `serde_yaml`.
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlProvider;

impl Provider for YamlProvider {
    fn consumes(&self) -> &[&str] {
        &["application/yaml", "text/yaml"]
    }

    fn produces(&self) -> &[&str] {
        &["application/yaml", "text/yaml"]
    }

    fn read(&self, body: &[u8]) -> Result<Value, ServiceError> {
        serde_yaml::from_slice(body).map_err(|e| ServiceError::Validation {
            status: 400,
            message: format!("malformed YAML body: {e}"),
        })
    }

    fn write(&self, value: &Value) -> Result<Vec<u8>, ServiceError> {
        serde_yaml::to_string(value)
            .map(String::into_bytes)
            .map_err(|e| ServiceError::Internal {
                message: format!("YAML serialization failed: {e}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_round_trip() {
        let provider = JsonProvider;
        let value = json!({ "name": "Fluffy", "species": "Cat", "age": 3 });
        let bytes = provider.write(&value).unwrap();
        let back = provider.read(&bytes).unwrap();
        assert_eq!(value, back);
    }

    #[test]
    fn json_read_rejects_garbage() {
        let err = JsonProvider.read(b"{nope").unwrap_err();
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn yaml_round_trip() {
        let provider = YamlProvider;
        let value = json!({ "items": [1, 2, 3], "ok": true });
        let bytes = provider.write(&value).unwrap();
        let back = provider.read(&bytes).unwrap();
        assert_eq!(value, back);
    }
}
