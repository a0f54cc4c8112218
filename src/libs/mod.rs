pub mod align;
pub mod engine;
pub mod error;
pub mod motif;
pub mod phylo;
pub mod pool;
pub mod scoring;
pub mod seq;

pub use error::{ProtreeError, Result};
