pub mod error;
pub mod migrations;
pub mod pool;
pub mod state;

pub use error::StoreError;
pub use migrations::{Migration, MigrationManager, CURRENT_VERSION};
pub use pool::connect;
pub use state::{StateStore, UpsertCounts};
