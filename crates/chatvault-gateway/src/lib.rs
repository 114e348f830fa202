//! ChatVault Gateway — validated tool routing to provider executors.

pub mod gateway;
pub mod schema;

pub use gateway::{ToolGateway, ToolResult};
pub use schema::validate_parameters;
