pub mod dependency_graph;

pub use dependency_graph::DependencyGraph;
