//! Merge single-sample HTSeq feature-counts files into one genes x samples
//! counts matrix, plus a companion metadata-matrix assembler.
//!
//! The merge engine lives in [`merge`]: a sequential reference merger used as
//! the correctness baseline and a divide-and-conquer recursive merger used as
//! the production path. [`audit`] holds the post-merge coherence spot-check
//! and the sequential-vs-recursive concordance test.

pub mod audit;
pub mod cache;
pub mod data_structs;
pub mod error;
pub mod io;
pub mod merge;
pub mod metadata;
pub mod utils;

pub mod prelude {
    pub use crate::audit::{coherence_check, concordance_test};
    pub use crate::data_structs::{CountsMatrix, CountsTable, GENE_COL};
    pub use crate::error::MergeError;
    pub use crate::io::read::read_counts;
    pub use crate::io::write::{write_frame, write_matrix, OutputFormat};
    pub use crate::merge::{merge_recursive, merge_sequential};
}
