//! Bulk export of saves into Postgres.

pub mod load;
pub mod migrate;

pub use load::load_save;
pub use migrate::{clear_save, migrate};
