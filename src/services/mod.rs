//! Services that wrap one injected collaborator each

pub mod announcer;
pub mod counter;
pub mod documents;
pub mod files;


// Re-export commonly used items
pub use announcer::Announcer;
pub use counter::{COUNTER_KEY, CounterService};
pub use documents::{DocumentService, GroupedWrite};
pub use files::FileService;
