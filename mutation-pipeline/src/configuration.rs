//! Logic for loading the pipeline configuration.

use std::str::FromStr;

use schemars::JsonSchema;
use schemars::r#gen::SchemaSettings;
use schemars::schema::RootSchema;
use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigurationError;

/// The configuration of the mutation pipeline.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct Configuration {
    /// Plugins to chain, in the order their hooks run.
    pub plugins: Vec<PluginConfiguration>,
}

/// One entry of the plugin chain.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PluginConfiguration {
    /// Name the plugin factory is registered under.
    pub name: String,
    /// Disabled plugins are not instantiated.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Plugin specific configuration, handed to the plugin as is.
    #[serde(default)]
    pub config: serde_json::Value,
}

fn default_enabled() -> bool {
    true
}

impl Configuration {
    /// Generate a JSON schema for the configuration.
    pub fn json_schema() -> RootSchema {
        let generator = SchemaSettings::draft07().into_generator();
        generator.into_root_schema_for::<Configuration>()
    }
}

/// Parse configuration from a string in YAML syntax
impl FromStr for Configuration {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_yaml::from_str(s).map_err(|e| ConfigurationError::DeserializeConfigError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_configuration() {
        assert_eq!(Configuration::from_str("{}").unwrap(), Configuration::default());
    }

    #[test]
    fn plugin_defaults() {
        let configuration = Configuration::from_str("plugins:\n  - name: acme.audit\n").unwrap();
        assert_eq!(
            configuration.plugins,
            vec![PluginConfiguration {
                name: "acme.audit".to_string(),
                enabled: true,
                config: serde_json::Value::Null,
            }]
        );
    }

    #[test]
    fn test_deny_unknown_fields() {
        let error = Configuration::from_str("plugin:\n  - name: acme.audit\n").unwrap_err();
        assert!(
            matches!(&error, ConfigurationError::DeserializeConfigError(message) if message.contains("unknown field `plugin`")),
            "{error}"
        );
        assert!(
            Configuration::from_str("plugins:\n  - name: acme.audit\n    enable: false\n")
                .is_err()
        );
    }

    #[test]
    fn schema_lists_plugin_properties() {
        let schema = serde_json::to_value(Configuration::json_schema()).unwrap();
        let plugin = &schema["definitions"]["PluginConfiguration"];
        assert_eq!(plugin["required"], serde_json::json!(["name"]));
        assert_eq!(plugin["additionalProperties"], serde_json::json!(false));
        assert!(plugin["properties"].get("config").is_some());
    }
}
