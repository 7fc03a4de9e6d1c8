//! Primitives that mutate live state: atomic writes and component links

pub mod links;
pub mod write;

pub use links::{ensure_link, platform_links, LinkAction, LinkError, LinkManager, ReplaceStrategy};
pub use write::{write_atomic, write_json_atomic};
