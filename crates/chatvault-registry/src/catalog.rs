//! Built-in provider catalog.
//!
//! One descriptor per supported provider, with the tool schemas the
//! UI-only assistants expose: extraction, realtime monitoring, and
//! export variants where the provider supports them.

use serde_json::Value;

use crate::types::{ParamField, ParameterSpec, ProviderDescriptor, ToolDescriptor};

const DEFAULT_MIN_POLL_SECS: u64 = 5;
const DEFAULT_MAX_POLL_SECS: u64 = 3600;

fn tool(
    name: &str,
    description: &str,
    category: &str,
    provider_id: &str,
    provider_specific: bool,
    parameters: ParameterSpec,
) -> ToolDescriptor {
    ToolDescriptor {
        name: name.to_string(),
        description: description.to_string(),
        category: category.to_string(),
        provider_id: provider_id.to_string(),
        provider_specific,
        parameters,
    }
}

fn chatgpt() -> ProviderDescriptor {
    let extract = tool(
        "extract_chatgpt_conversations",
        "Extract all conversations from ChatGPT web interface using DOM parsing",
        "chat_extraction",
        "chatgpt",
        true,
        ParameterSpec::new()
            .field("session_token", ParamField::string("ChatGPT session token"))
            .field(
                "max_conversations",
                ParamField::number("Maximum conversations to extract")
                    .with_default(Value::from(100)),
            )
            .field(
                "include_archived",
                ParamField::boolean("Include archived conversations")
                    .with_default(Value::from(false)),
            )
            .field(
                "date_range",
                ParamField::object("").with_properties(vec![
                    ("start_date", ParamField::string("").with_format("date")),
                    ("end_date", ParamField::string("").with_format("date")),
                ]),
            )
            .require("session_token"),
    );

    let monitor = tool(
        "monitor_chatgpt_realtime",
        "Monitor ChatGPT for new messages in real-time",
        "real_time_monitoring",
        "chatgpt",
        true,
        ParameterSpec::new()
            .field("session_token", ParamField::string("ChatGPT session token"))
            .field(
                "webhook_url",
                ParamField::string("Webhook URL for new message notifications"),
            )
            .field(
                "polling_interval",
                ParamField::number("Polling interval in seconds").with_default(Value::from(30)),
            )
            .require("session_token")
            .require("webhook_url"),
    );

    let export = tool(
        "export_chatgpt_conversation",
        "Export specific ChatGPT conversation with full formatting",
        "data_export",
        "chatgpt",
        true,
        ParameterSpec::new()
            .field(
                "conversation_id",
                ParamField::string("ChatGPT conversation ID"),
            )
            .field(
                "format",
                ParamField::string("")
                    .with_enum(&["json", "markdown", "html"])
                    .with_default(Value::from("json")),
            )
            .field(
                "include_metadata",
                ParamField::boolean("").with_default(Value::from(true)),
            )
            .require("conversation_id"),
    );

    ProviderDescriptor {
        id: "chatgpt".into(),
        name: "ChatGPT".into(),
        tools: vec![extract, monitor, export],
        credential_fields: vec!["session_token".into()],
        auth_methods: vec!["session_token".into(), "cookie".into()],
        extraction_methods: vec![
            "web_scraping".into(),
            "dom_parsing".into(),
            "api_integration".into(),
        ],
        min_poll_interval_secs: DEFAULT_MIN_POLL_SECS,
        max_poll_interval_secs: DEFAULT_MAX_POLL_SECS,
        expected_extraction_secs: 60,
    }
}

fn claude() -> ProviderDescriptor {
    let extract = tool(
        "extract_claude_conversations",
        "Extract conversations from Claude web interface",
        "chat_extraction",
        "claude",
        true,
        ParameterSpec::new()
            .field("session_cookie", ParamField::string("Claude session cookie"))
            .field(
                "organization_id",
                ParamField::string("Claude organization ID"),
            )
            .field(
                "max_conversations",
                ParamField::number("").with_default(Value::from(100)),
            )
            .field(
                "include_artifacts",
                ParamField::boolean("Include Claude artifacts").with_default(Value::from(true)),
            )
            .require("session_cookie"),
    );

    let monitor = tool(
        "monitor_claude_projects",
        "Monitor Claude projects for new conversations",
        "project_monitoring",
        "claude",
        true,
        ParameterSpec::new()
            .field("session_cookie", ParamField::string("Claude session cookie"))
            .field(
                "project_ids",
                ParamField::array("Project IDs to monitor"),
            )
            .field("webhook_url", ParamField::string("Webhook for notifications"))
            .require("session_cookie")
            .require("webhook_url"),
    );

    ProviderDescriptor {
        id: "claude".into(),
        name: "Claude".into(),
        tools: vec![extract, monitor],
        credential_fields: vec!["session_cookie".into()],
        auth_methods: vec!["session_token".into(), "cookie".into()],
        extraction_methods: vec![
            "web_scraping".into(),
            "dom_parsing".into(),
            "api_integration".into(),
        ],
        min_poll_interval_secs: DEFAULT_MIN_POLL_SECS,
        max_poll_interval_secs: DEFAULT_MAX_POLL_SECS,
        expected_extraction_secs: 60,
    }
}

fn gemini() -> ProviderDescriptor {
    let extract = tool(
        "extract_gemini_conversations",
        "Extract conversations from Google Gemini",
        "chat_extraction",
        "gemini",
        true,
        ParameterSpec::new()
            .field("google_session", ParamField::string("Google session token"))
            .field(
                "workspace_id",
                ParamField::string("Google Workspace ID (if applicable)"),
            )
            .field(
                "max_conversations",
                ParamField::number("").with_default(Value::from(100)),
            )
            .field(
                "include_extensions",
                ParamField::boolean("Include Gemini extensions data")
                    .with_default(Value::from(false)),
            )
            .require("google_session"),
    );

    ProviderDescriptor {
        id: "gemini".into(),
        name: "Gemini".into(),
        tools: vec![extract],
        credential_fields: vec!["google_session".into()],
        auth_methods: vec!["session_token".into(), "cookie".into()],
        extraction_methods: vec![
            "web_scraping".into(),
            "dom_parsing".into(),
            "api_integration".into(),
        ],
        min_poll_interval_secs: DEFAULT_MIN_POLL_SECS,
        max_poll_interval_secs: DEFAULT_MAX_POLL_SECS,
        expected_extraction_secs: 60,
    }
}

fn perplexity() -> ProviderDescriptor {
    let extract = tool(
        "extract_perplexity_conversations",
        "Extract conversations from Perplexity AI",
        "chat_extraction",
        "perplexity",
        true,
        ParameterSpec::new()
            .field(
                "auth_token",
                ParamField::string("Perplexity authentication token"),
            )
            .field(
                "max_conversations",
                ParamField::number("").with_default(Value::from(100)),
            )
            .field(
                "include_sources",
                ParamField::boolean("Include source citations").with_default(Value::from(true)),
            )
            .require("auth_token"),
    );

    ProviderDescriptor {
        id: "perplexity".into(),
        name: "Perplexity".into(),
        tools: vec![extract],
        credential_fields: vec!["auth_token".into()],
        auth_methods: vec!["session_token".into(), "cookie".into()],
        extraction_methods: vec![
            "web_scraping".into(),
            "dom_parsing".into(),
            "api_integration".into(),
        ],
        min_poll_interval_secs: DEFAULT_MIN_POLL_SECS,
        max_poll_interval_secs: DEFAULT_MAX_POLL_SECS,
        expected_extraction_secs: 60,
    }
}

fn custom() -> ProviderDescriptor {
    let extract = tool(
        "extract_custom_provider",
        "Generic extraction tool for custom AI providers",
        "chat_extraction",
        "custom",
        false,
        ParameterSpec::new()
            .field("provider_url", ParamField::string("Provider base URL"))
            .field(
                "auth_method",
                ParamField::string("")
                    .with_enum(&["bearer", "cookie", "header", "query"])
                    .with_default(Value::from("bearer")),
            )
            .field("auth_value", ParamField::string("Authentication value"))
            .field(
                "extraction_config",
                ParamField::object("").with_properties(vec![
                    (
                        "conversation_selector",
                        ParamField::string("CSS selector for conversations"),
                    ),
                    (
                        "message_selector",
                        ParamField::string("CSS selector for messages"),
                    ),
                    (
                        "title_selector",
                        ParamField::string("CSS selector for conversation titles"),
                    ),
                ]),
            )
            .require("provider_url")
            .require("auth_value")
            .require("extraction_config"),
    );

    ProviderDescriptor {
        id: "custom".into(),
        name: "Custom".into(),
        tools: vec![extract],
        credential_fields: vec!["auth_value".into()],
        auth_methods: vec![
            "bearer".into(),
            "cookie".into(),
            "header".into(),
            "query".into(),
        ],
        extraction_methods: vec![
            "web_scraping".into(),
            "dom_parsing".into(),
            "api_integration".into(),
        ],
        min_poll_interval_secs: DEFAULT_MIN_POLL_SECS,
        max_poll_interval_secs: DEFAULT_MAX_POLL_SECS,
        expected_extraction_secs: 120,
    }
}

/// All built-in provider descriptors.
pub fn builtin_providers() -> Vec<ProviderDescriptor> {
    vec![chatgpt(), claude(), gemini(), perplexity(), custom()]
}
