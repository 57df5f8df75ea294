//! Saving a running simulation to disk and loading it back.

pub mod jsonl;
pub mod save;

pub use jsonl::{load_from_jsonl, read_save, save_to_jsonl, write_save};
pub use save::{BuildQueueRow, ManagerRow, MetaRow, SaveGame};
