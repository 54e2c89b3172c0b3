pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod membership;
pub mod roster;
pub mod schema;
pub mod session;
pub mod signatures;
pub mod store;
pub mod tally;
pub mod validation;

pub use db::SqliteStore;
pub use error::{Action, BoardError, BoardResult};
pub use session::Caller;
pub use store::ResolutionStore;
