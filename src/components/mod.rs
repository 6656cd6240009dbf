pub mod tree_graph;
