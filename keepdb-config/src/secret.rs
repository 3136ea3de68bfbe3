use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};

/// A [`SecretString`] that can be written back out by serde.
///
/// [`SecretString`] deliberately refuses to serialize. Connection configs are printed back
/// (for example when handing a test database to a child process), so this wrapper
/// serializes the exposed value while keeping [`fmt::Debug`] redacted.
#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub struct SerializableSecretString(SecretString);

impl ExposeSecret<String> for SerializableSecretString {
    fn expose_secret(&self) -> &String {
        self.0.expose_secret()
    }
}

impl From<String> for SerializableSecretString {
    fn from(value: String) -> Self {
        Self(SecretString::new(value))
    }
}

impl From<&str> for SerializableSecretString {
    fn from(value: &str) -> Self {
        Self::from(value.to_owned())
    }
}

impl Serialize for SerializableSecretString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.0.expose_secret())
    }
}

impl fmt::Debug for SerializableSecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_is_redacted() {
        let secret = SerializableSecretString::from("hunter2");

        assert_eq!(format!("{secret:?}"), "[REDACTED]");
        assert_eq!(secret.expose_secret(), "hunter2");
    }

    #[test]
    fn serializes_exposed_value() {
        let secret = SerializableSecretString::from("hunter2");

        let json = serde_json::to_string(&secret).unwrap();

        assert_eq!(json, "\"hunter2\"");
    }
}
