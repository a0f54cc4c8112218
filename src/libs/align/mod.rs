pub mod identity;
pub mod local;
pub mod msa;
pub mod profile;

pub use identity::{percent_identity, rank, top_n, RankedHit};
pub use local::AlignmentResult;
pub use msa::{align_many, MultipleAlignment};
