// Database layer module: connection pool and schema migrations

pub mod migrations;
pub mod pool;

pub use migrations::{migrate, MigrationReport, MigrationSet, MIGRATOR};
pub use pool::DbPool;
