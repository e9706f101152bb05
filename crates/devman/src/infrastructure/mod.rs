//! Infrastructure layer for the device manager binary.
//!
//! Contains the adapters that sit around the application layer: the
//! in-memory host, configuration file storage, and the replay script runner.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `devman_core`, but MUST NOT be imported by the `application` or domain
//! layers.

pub mod host;
pub mod replay;
pub mod storage;
