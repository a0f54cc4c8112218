pub mod bootstrap;
pub mod build;
pub mod distance;
pub mod node;
pub mod tree;

pub use bootstrap::{bootstrap_support, BootstrapOptions, BootstrapSupport};
pub use distance::{distance_matrix, pairwise_distance, DistanceMatrix, DistanceModel};
pub use node::{Node, NodeId};
pub use tree::Tree;
