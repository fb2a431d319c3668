//! In-memory representations of a single-sample counts table and the merged
//! counts matrix. Both are thin wrappers over [`polars::frame::DataFrame`]
//! that enforce the column layout the merge engine relies on.

mod matrix;
mod table;

pub use matrix::CountsMatrix;
pub use table::CountsTable;

/// Name of the row-key column in every table and in the merged matrix.
pub const GENE_COL: &str = "Gene Name";

/// Name of the row-key column in the metadata matrix.
pub const SAMPLE_ID_COL: &str = "Sample ID";
