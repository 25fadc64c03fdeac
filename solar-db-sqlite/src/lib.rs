//! SQLite storage for clients and company settings.
//!
//! Clients are kept as JSON documents stamped with the schema version they
//! were written with; older documents are upgraded when read and can be
//! rewritten in bulk with [`SqliteRepository::upgrade_stored_clients`].

pub mod factory;
pub mod repository;

pub use factory::SqliteRepositoryFactory;
pub use repository::{SqliteRepository, connection_url};
