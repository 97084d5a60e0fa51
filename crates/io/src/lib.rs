// Boundary adapters: snapshot extraction, reference areas, history output

pub mod areas;
pub mod collection;
pub mod csv;
pub mod error;
pub mod output;
pub mod source;

pub use areas::load_reference_areas;
pub use error::IoError;
pub use output::{write_history, OutputReceipt};
pub use source::load_snapshot;
