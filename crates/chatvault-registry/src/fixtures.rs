//! Fixture executors — canned payloads standing in for real scrapers.
//!
//! Each provider's real executor drives a browser or private API; that
//! work is pluggable and out of scope here. The fixtures return known
//! payloads so the full pipeline can be wired and exercised end to end.

use async_trait::async_trait;
use chatvault_core::{Credential, Result};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::registry::{Executor, RawPayload};

/// Executor returning a fixed extraction payload per provider.
pub struct FixtureExecutor {
    provider: String,
}

impl FixtureExecutor {
    pub fn new(provider: &str) -> Self {
        Self {
            provider: provider.to_string(),
        }
    }

    fn payload(&self) -> Value {
        match self.provider.as_str() {
            "chatgpt" => json!({
                "conversations": [
                    {
                        "id": "chatgpt_conv_1",
                        "title": "Python Data Analysis Help",
                        "messages": [
                            {
                                "role": "user",
                                "content": "Can you help me analyze a CSV file with pandas?",
                                "timestamp": "2024-01-15T10:00:00Z"
                            },
                            {
                                "role": "assistant",
                                "content": "I'd be happy to help you analyze a CSV file with pandas! Here's a comprehensive approach...",
                                "timestamp": "2024-01-15T10:00:15Z"
                            }
                        ],
                        "created_at": "2024-01-15T10:00:00Z",
                        "updated_at": "2024-01-15T10:30:00Z"
                    },
                    {
                        "id": "chatgpt_conv_2",
                        "title": "React Component Design",
                        "messages": [
                            {
                                "role": "user",
                                "content": "How do I create a reusable modal component in React?",
                                "timestamp": "2024-01-15T14:00:00Z"
                            },
                            {
                                "role": "assistant",
                                "content": "Creating a reusable modal component in React involves several key considerations...",
                                "timestamp": "2024-01-15T14:00:20Z"
                            }
                        ],
                        "created_at": "2024-01-15T14:00:00Z",
                        "updated_at": "2024-01-15T14:45:00Z"
                    }
                ],
                "metadata": {
                    "provider": "chatgpt",
                    "extraction_method": "web_scraping",
                    "total_conversations": 2
                }
            }),
            "claude" => json!({
                "conversations": [
                    {
                        "id": "claude_conv_1",
                        "title": "System Architecture Discussion",
                        "messages": [
                            {
                                "role": "user",
                                "content": "I need help designing a microservices architecture for an e-commerce platform.",
                                "timestamp": "2024-01-15T11:00:00Z"
                            },
                            {
                                "role": "assistant",
                                "content": "I'll help you design a robust microservices architecture for your e-commerce platform...",
                                "timestamp": "2024-01-15T11:00:25Z"
                            }
                        ],
                        "created_at": "2024-01-15T11:00:00Z",
                        "updated_at": "2024-01-15T12:00:00Z"
                    }
                ],
                "metadata": {
                    "provider": "claude",
                    "extraction_method": "api_scraping",
                    "total_conversations": 1
                }
            }),
            other => json!({
                "conversations": [],
                "metadata": {
                    "provider": other,
                    "extraction_method": "unknown",
                    "total_conversations": 0
                }
            }),
        }
    }
}

#[async_trait]
impl Executor for FixtureExecutor {
    async fn extract(
        &self,
        _credential: &Credential,
        _parameters: &Value,
    ) -> Result<RawPayload> {
        Ok(self.payload())
    }

    async fn poll_for_new(
        &self,
        _credential: &Credential,
        _since: Option<DateTime<Utc>>,
    ) -> Result<RawPayload> {
        Ok(self.payload())
    }
}
