//! Collaborator traits implemented by the host.
//!
//! The device manager never talks to a windowing system or a tool registry
//! directly.  Both are injected at construction time behind the traits below,
//! which keeps every transition in [`super::device_manager`] unit-testable.
//!
//! The production host is a GUI toolkit; [`crate::infrastructure::host::memory`]
//! provides an in-memory implementation used by the replay binary and tests.

use std::ops::{Deref, DerefMut};

use devman_core::{Device, ToolInfo};

/// Read access to the windowing system's displays and devices.
#[cfg_attr(test, mockall::automock)]
pub trait DisplayServer {
    /// Names of all currently open displays, in the order they were opened.
    fn list_displays(&self) -> Vec<String>;

    /// Name of the default display, if any display is open.
    fn default_display(&self) -> Option<String>;

    /// Devices currently present on `display`.
    fn list_devices(&self, display: &str) -> Vec<Device>;

    /// The primary pointing device of `display`.
    fn core_pointer(&self, display: &str) -> Option<Device>;
}

/// The user context that owns the active tool.
///
/// Implementations emit a tool-changed notification whenever the active tool
/// changes, except while blocked.
pub trait ToolContext {
    fn active_tool(&self) -> Option<ToolInfo>;

    /// Tool given to devices seen for the first time.
    fn default_tool(&self) -> Option<ToolInfo>;

    fn lookup_tool(&self, name: &str) -> Option<ToolInfo>;

    /// Makes `tool` the active tool.
    fn set_active_tool(&mut self, tool: &ToolInfo);

    /// Suppresses tool-changed notifications until the matching
    /// [`unblock_tool_changed`](Self::unblock_tool_changed).  Calls nest.
    fn block_tool_changed(&mut self);

    fn unblock_tool_changed(&mut self);
}

/// Keeps tool-changed notifications blocked for as long as it lives.
///
/// Dereferences to the wrapped context so restores can go through it.
pub struct ToolChangedBlock<'a> {
    context: &'a mut (dyn ToolContext + 'a),
}

impl<'a> ToolChangedBlock<'a> {
    pub fn new(context: &'a mut (dyn ToolContext + 'a)) -> Self {
        context.block_tool_changed();
        Self { context }
    }
}

impl<'a> Deref for ToolChangedBlock<'a> {
    type Target = dyn ToolContext + 'a;

    fn deref(&self) -> &Self::Target {
        self.context
    }
}

impl<'a> DerefMut for ToolChangedBlock<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.context
    }
}

impl Drop for ToolChangedBlock<'_> {
    fn drop(&mut self) {
        self.context.unblock_tool_changed();
    }
}
