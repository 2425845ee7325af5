use super::HuewallConfig;

/// Generates the JSON Schema of the configuration file.
#[must_use]
pub fn generate_schema() -> schemars::Schema {
    let mut schema = schemars::schema_for!(HuewallConfig);

    if let Some(obj) = schema.as_object_mut() {
        obj.insert(
            "$id".to_string(),
            serde_json::json!(
                "https://raw.githubusercontent.com/andbar-ru/huewall/main/huewall.schema.json"
            ),
        );
    }

    schema
}

/// Pretty-printed JSON Schema of the configuration file.
#[must_use]
pub fn generate_schema_json() -> String {
    serde_json::to_string_pretty(&generate_schema()).unwrap_or_default()
}
