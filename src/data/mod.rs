//! Data loading module

pub mod csv;

pub use csv::{load_edge_list, load_node_attributes, load_partitions, EdgeListFormat, NodeAttributes};
