pub mod csv_export;
pub mod snapshot;

pub use snapshot::{load_snapshot, save_snapshot};
