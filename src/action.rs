//! The action-provider surface.
//!
//! A provider exposes named actions, each described by a JSON Schema for
//! its input, so a host agent framework can discover them by reflection and
//! route model-produced arguments to the right method. Input validation is
//! by deserialization: a payload that parses into the action's argument
//! type is valid.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;

use crate::network::Network;
use crate::wallet::WalletKind;

/// A discoverable action: name, prompt-facing description, and the JSON
/// Schema of its input.
#[derive(Debug, Clone)]
pub struct ActionDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: serde_json::Value,
}

/// Generates the JSON Schema for an action's argument type.
pub fn schema_for<T: JsonSchema>() -> serde_json::Value {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(schema).unwrap_or_else(|_| serde_json::json!({}))
}

/// Validates JSON input against an action's argument type.
pub fn parse_args<T: DeserializeOwned>(input: &serde_json::Value) -> Result<T, String> {
    serde_json::from_value(input.clone()).map_err(|e| format!("Invalid input: {e}"))
}

/// A group of related actions sharing configuration and a wallet.
///
/// Actions return strings (human-readable or JSON) rather than typed
/// results, because the consumer is a language model: failures are reported
/// as structured JSON the model can inspect and react to, not raised as
/// errors.
#[async_trait]
pub trait ActionProvider: Send + Sync {
    /// The provider's namespace (e.g. "x402").
    fn name(&self) -> &str;

    /// Descriptors for every action this provider exposes.
    fn actions(&self) -> Vec<ActionDescriptor>;

    /// Whether this provider can operate on the given network.
    fn supports_network(&self, network: &Network) -> bool;

    /// Invokes the named action with JSON arguments.
    ///
    /// Unknown action names and invalid arguments are reported in the
    /// returned string, consistent with the error policy above.
    async fn invoke(&self, wallet: &WalletKind, action: &str, args: serde_json::Value) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, JsonSchema)]
    struct TestArgs {
        url: String,
        #[serde(default)]
        keyword: Option<String>,
    }

    #[test]
    fn generates_object_schema() {
        let schema = schema_for::<TestArgs>();
        assert!(schema.is_object());
        assert!(schema["properties"]["url"].is_object());
    }

    #[test]
    fn validates_by_deserialization() {
        let ok: Result<TestArgs, _> =
            parse_args(&serde_json::json!({"url": "https://api.example.com"}));
        let parsed = ok.unwrap();
        assert_eq!(parsed.url, "https://api.example.com");
        assert!(parsed.keyword.is_none());

        let missing: Result<TestArgs, _> = parse_args(&serde_json::json!({"keyword": "weather"}));
        assert!(missing.is_err());
    }
}
