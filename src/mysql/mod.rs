// MySQL module - the `mysql_async` side of the session's backend seam
//
// This module is split into several sub-modules:
// - config: Session options to driver options
// - error: Driver errors to the session's error tags
// - params: Parameter conversion from `RowValues`
// - query: Row fetching and value conversion
// - connection: The `Backend` / `BackendConnection` implementations

pub mod config;
pub mod connection;
pub mod error;
pub mod params;
pub mod query;

pub use config::build_opts;
pub use connection::{MySqlBackend, MySqlConnection};
pub use error::map_mysql_error;
pub use params::Params;
