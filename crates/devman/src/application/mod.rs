//! Application layer of the device manager.
//!
//! # What is the "application" layer? (for beginners)
//!
//! The domain crate (`devman-core`) knows what a device record or a display
//! refcount is.  This layer decides what to *do* with them when the host
//! reports something:
//!
//! - **Orchestrate** domain objects in response to host notifications
//!   (a display opened, a pen was unplugged, the user picked another tool).
//! - **Depend on abstractions** (the traits in [`host`]) rather than on a
//!   windowing system, so the host can be swapped without changing this code.
//! - **Contain no I/O**.
//!
//! # Sub-modules
//!
//! - **`host`**           – Collaborator traits the host implements.
//!
//! - **`tool_binding`**   – The state machine that links the active tool's
//!   options to the current device's preset.
//!
//! - **`device_manager`** – Display and device bookkeeping plus the current
//!   device; routes every host notification.

pub mod device_manager;
pub mod host;
pub mod tool_binding;
