//! Display module for terminal output and formatting

pub mod formatter;
pub mod terminal;

// Re-export commonly used items
pub use formatter::{format_check, format_document, format_query, format_snapshot};
pub use terminal::Terminal;
