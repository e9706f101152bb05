//! # devman-core
//!
//! Domain library for the input device manager: display reference counts,
//! persistent device records, and linkable tool option bundles.
//!
//! It has zero dependencies on windowing systems, GUI toolkits or I/O.
//!
//! # Architecture overview (for beginners)
//!
//! A drawing application can be driven by several input devices at once: a
//! mouse, a pen, the eraser end of that pen, a tablet puck.  Users expect each
//! of them to remember its own tool ("the eraser end erases, the pen end
//! paints with a 3px brush").  The `devman` crate implements that policy; this
//! crate provides the data it works on:
//!
//! - **`domain::display`** – counts open notifications per display name so a
//!   display reported twice is only enumerated once.
//!
//! - **`domain::device`** / **`domain::directory`** – a record per device
//!   name, surviving unplug/replug, stored in a sorted unique-name container.
//!
//! - **`domain::options`** – settings bundles that can be linked so edits to
//!   the active tool flow into the current device's preset and back.

pub mod domain;

// Re-export the most-used types at the crate root so callers can write
// `devman_core::DeviceRecord` instead of `devman_core::domain::device::DeviceRecord`.
pub use domain::device::{compare_records, Device, DeviceId, DeviceKind, DeviceRecord, ToolPreset};
pub use domain::directory::{DeviceDirectory, DirectoryError, RecordOrder};
pub use domain::display::{DisplayRegistry, RefChange};
pub use domain::event::{ConfigFlag, HostEvent};
pub use domain::options::{OptionValue, ToolOptions};
pub use domain::tool::ToolInfo;
