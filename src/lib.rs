pub mod common;
pub mod data_loader;
pub mod degree;
pub mod errors;
pub mod execution;
pub mod export;
pub mod filter;
pub mod graph;
pub mod mapping;
pub mod normalize;
pub mod state;
pub mod style;
pub mod timeline;
pub mod transform;
