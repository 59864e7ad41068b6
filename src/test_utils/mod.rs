/// In-memory backend with scripted failures, for exercising the retry paths
pub mod scripted;

/// Small constructors shared by tests
pub mod test_helpers;

pub use scripted::{ScriptEvent, ScriptedBackend, ScriptedConnection};
pub use test_helpers::test_options;
