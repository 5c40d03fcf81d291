//! Feature and module resolution.
//!
//! Both resolvers are single-threaded and deterministic: the same inputs
//! always produce the same decisions in the same order.
pub mod features;
pub mod modules;

pub use features::Overrides;
