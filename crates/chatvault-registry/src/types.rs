//! Provider and tool descriptor types.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// JSON-schema-style value type for a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl ParamType {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Number => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Object => value.is_object(),
            ParamType::Array => value.is_array(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Object => "object",
            ParamType::Array => "array",
        }
    }
}

/// Schema for a single tool parameter.
#[derive(Debug, Clone, Serialize)]
pub struct ParamField {
    #[serde(rename = "type")]
    pub param_type: ParamType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Nested schema for object-typed fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, ParamField>>,
}

impl ParamField {
    fn typed(param_type: ParamType, description: &str) -> Self {
        Self {
            param_type,
            description: if description.is_empty() {
                None
            } else {
                Some(description.to_string())
            },
            default: None,
            enum_values: None,
            format: None,
            properties: None,
        }
    }

    pub fn string(description: &str) -> Self {
        Self::typed(ParamType::String, description)
    }

    pub fn number(description: &str) -> Self {
        Self::typed(ParamType::Number, description)
    }

    pub fn boolean(description: &str) -> Self {
        Self::typed(ParamType::Boolean, description)
    }

    pub fn object(description: &str) -> Self {
        Self::typed(ParamType::Object, description)
    }

    pub fn array(description: &str) -> Self {
        Self::typed(ParamType::Array, description)
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_enum(mut self, values: &[&str]) -> Self {
        self.enum_values = Some(values.iter().map(|v| Value::from(*v)).collect());
        self
    }

    pub fn with_format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }

    pub fn with_properties(mut self, props: Vec<(&str, ParamField)>) -> Self {
        self.properties = Some(
            props
                .into_iter()
                .map(|(name, field)| (name.to_string(), field))
                .collect(),
        );
        self
    }
}

/// Parameter schema for a tool: typed properties plus a required list.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParameterSpec {
    pub properties: BTreeMap<String, ParamField>,
    pub required: Vec<String>,
}

impl ParameterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &str, field: ParamField) -> Self {
        self.properties.insert(name.to_string(), field);
        self
    }

    pub fn require(mut self, name: &str) -> Self {
        self.required.push(name.to_string());
        self
    }
}

/// A single tool a provider exposes.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub category: String,
    pub provider_id: String,
    pub provider_specific: bool,
    pub parameters: ParameterSpec,
}

/// Static description of a provider: identity, tools, auth requirements,
/// and the timing hints the scheduler and monitor consult.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderDescriptor {
    pub id: String,
    pub name: String,
    pub tools: Vec<ToolDescriptor>,
    pub credential_fields: Vec<String>,
    pub auth_methods: Vec<String>,
    pub extraction_methods: Vec<String>,
    pub min_poll_interval_secs: u64,
    pub max_poll_interval_secs: u64,
    /// Rough expected duration of a full extraction, for progress display.
    pub expected_extraction_secs: u64,
}

impl ProviderDescriptor {
    /// Clamp a requested polling interval into this provider's bounds.
    pub fn clamp_poll_interval(&self, requested: u64) -> u64 {
        requested
            .max(self.min_poll_interval_secs)
            .min(self.max_poll_interval_secs)
    }

    /// Blank out credential fields in a parameter object. Secret material
    /// reaches executors through the credential, never through stored or
    /// echoed parameters.
    pub fn redact_parameters(&self, parameters: &mut Value) {
        if let Some(map) = parameters.as_object_mut() {
            for field in &self.credential_fields {
                if let Some(value) = map.get_mut(field) {
                    *value = Value::from("<redacted>");
                }
            }
        }
    }
}
