pub mod filter;
pub mod outcome;
pub mod row;
pub mod session;

pub use filter::{FilterField, FilterSource, FilterState, FILTER_FIELDS};
pub use outcome::{RowOutcome, RunStats};
pub use row::{ArchiveRow, RowRange, ROW_SELECTOR};
pub use session::{PageContext, SessionIds};
