//! Host adapters.
//!
//! Only an in-memory host ships with this crate.  A toolkit integration
//! would live next to it and implement the same two traits from
//! [`crate::application::host`].

pub mod memory;

pub use memory::MemoryHost;
