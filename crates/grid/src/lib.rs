pub mod extract;
pub mod grid;
pub mod table;

pub use extract::{extract_raw, ExtractError};
pub use grid::{ColumnDef, Grid};
pub use table::Table;
