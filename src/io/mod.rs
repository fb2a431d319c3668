//! Reading raw counts files and serializing merged matrices.

pub mod read;
pub mod write;
