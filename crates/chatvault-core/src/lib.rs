//! ChatVault Core — error taxonomy, configuration, canonical data model.

pub mod active;
pub mod config;
pub mod credential;
pub mod error;
pub mod types;

pub use active::{ActiveGuard, ActiveSet};
pub use config::ChatVaultConfig;
pub use credential::{Credential, ValidationRecord};
pub use error::{Error, ErrorDetail, FieldViolation, Result};
pub use types::{Conversation, Message, Role, ToolCallRecord};
