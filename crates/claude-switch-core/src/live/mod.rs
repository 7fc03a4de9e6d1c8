//! Live configuration files owned partly by profiles

pub mod claude_json;
pub mod settings;

pub use claude_json::{read_mcp_servers, write_mcp_servers};
pub use settings::LiveSettings;
