//! Domain types shared by the store, the providers and the pipeline.

pub mod asset;
pub mod bar;

pub use asset::Asset;
pub use bar::Bar;
