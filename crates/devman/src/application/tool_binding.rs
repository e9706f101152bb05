//! ToolBinding: links the active tool's options to the current device's preset.
//!
//! While devices keep their own tools (`devices_share_tool == false`), the
//! active tool's options bundle is *connected* to the current device's preset
//! bundle, so every edit the user makes is stored for that device as it
//! happens.  Switching devices, switching tools or toggling the share flag
//! moves the link:
//!
//! ```text
//!                 set_current_device(B)
//!   tool ◄──► A.preset   ────────────────►   restore B.preset into tool
//!                                            tool ◄──► B.preset
//!
//!                 tool_changed(T2)
//!   T1 ◄──► A.preset     ────────────────►   A.preset := copy of T2
//!                                            T2 ◄──► A.preset
//! ```
//!
//! When devices share tools, nothing is ever linked and presets only change
//! when the flag is switched on (the current device's settings are frozen
//! into its preset at that moment).
//!
//! Restoring a preset changes the context's active tool, which makes the
//! context emit a tool-changed notification that would feed straight back
//! into [`ToolBinding::tool_changed`].  Restores therefore run inside a
//! [`ToolChangedBlock`].

use devman_core::{DeviceDirectory, DeviceRecord, ToolInfo, ToolOptions};
use tracing::{debug, warn};

use super::host::{ToolChangedBlock, ToolContext};

/// Applies `record`'s stored tool to `context`: activates the saved tool and
/// copies the saved settings into its options.
///
/// The caller is responsible for blocking tool-changed notifications.
pub fn restore_tool(record: &DeviceRecord, context: &mut dyn ToolContext) {
    let preset = record.preset();
    let Some(tool_name) = preset.tool_name() else {
        debug!(device = record.name(), "no stored tool to restore");
        return;
    };
    let Some(tool) = context.lookup_tool(tool_name) else {
        warn!(
            device = record.name(),
            tool = tool_name,
            "stored tool is not known to the context"
        );
        return;
    };
    context.set_active_tool(&tool);
    tool.options().sync_from(preset.options());
    debug!(device = record.name(), tool = tool_name, "restored device tool");
}

/// State of the device/tool link.
#[derive(Debug)]
pub struct ToolBinding {
    share_tool: bool,
    active_tool: Option<ToolInfo>,
}

impl ToolBinding {
    pub fn new(share_tool: bool) -> Self {
        Self {
            share_tool,
            active_tool: None,
        }
    }

    /// `true` when all devices drive the same tool options.
    pub fn shares_tool(&self) -> bool {
        self.share_tool
    }

    pub fn active_tool(&self) -> Option<&ToolInfo> {
        self.active_tool.as_ref()
    }

    /// Returns `true` if the active tool is currently linked to `current`'s
    /// preset.
    pub fn is_connected(&self, directory: &DeviceDirectory, current: Option<&str>) -> bool {
        match (&self.active_tool, preset_options(directory, current)) {
            (Some(tool), Some(preset)) => tool.options().is_connected(&preset),
            _ => false,
        }
    }

    /// Links the active tool's options to `current`'s preset.  No-op when
    /// tools are shared or either side is missing.
    pub fn connect(&self, directory: &DeviceDirectory, current: Option<&str>) {
        if self.share_tool {
            return;
        }
        if let (Some(tool), Some(preset)) = (&self.active_tool, preset_options(directory, current)) {
            tool.options().connect(&preset);
            debug!(tool = tool.name(), device = current, "tool connected");
        }
    }

    /// Unlinks the active tool's options from `current`'s preset.  Safe to
    /// call when nothing is linked.
    pub fn disconnect(&self, directory: &DeviceDirectory, current: Option<&str>) {
        if self.share_tool {
            return;
        }
        if let (Some(tool), Some(preset)) = (&self.active_tool, preset_options(directory, current)) {
            tool.options().disconnect(&preset);
            debug!(tool = tool.name(), device = current, "tool disconnected");
        }
    }

    /// Runs before the current device changes away from `current`.
    pub fn leave_device(&self, directory: &DeviceDirectory, current: Option<&str>) {
        if !self.share_tool && current.is_some() {
            self.disconnect(directory, current);
        }
    }

    /// Runs after `current` became the current device: restores its tool and
    /// links it.
    pub fn enter_device(
        &mut self,
        directory: &DeviceDirectory,
        current: Option<&str>,
        context: &mut dyn ToolContext,
    ) {
        if self.share_tool || current.is_none() {
            return;
        }
        self.restore(directory, current, context);
        self.connect(directory, current);
    }

    /// Handles a tool-changed notification from the context.
    pub fn tool_changed(
        &mut self,
        tool: ToolInfo,
        directory: &mut DeviceDirectory,
        current: Option<&str>,
    ) {
        if !self.share_tool {
            self.disconnect(directory, current);
        }

        debug!(tool = tool.name(), "active tool changed");
        self.active_tool = Some(tool);

        if !self.share_tool {
            self.save(directory, current);
            self.connect(directory, current);
        }
    }

    /// Applies a change of the share flag.  Setting the value it already has
    /// does nothing.
    pub fn set_share_tool(
        &mut self,
        share_tool: bool,
        directory: &mut DeviceDirectory,
        current: Option<&str>,
        context: &mut dyn ToolContext,
    ) {
        if share_tool == self.share_tool {
            debug!(share_tool, "share flag unchanged");
            return;
        }

        if share_tool {
            // Must unlink while still in per-device mode; disconnect is a
            // no-op once the flag is set.
            self.disconnect(directory, current);
            self.share_tool = true;
            self.save(directory, current);
        } else {
            self.share_tool = false;
            self.restore(directory, current, context);
            self.connect(directory, current);
        }
    }

    fn save(&self, directory: &mut DeviceDirectory, current: Option<&str>) {
        let (Some(tool), Some(name)) = (&self.active_tool, current) else {
            return;
        };
        if directory.update(name, |record| record.save_tool(tool)).is_some() {
            debug!(device = name, tool = tool.name(), "saved device tool");
        }
    }

    fn restore(
        &mut self,
        directory: &DeviceDirectory,
        current: Option<&str>,
        context: &mut dyn ToolContext,
    ) {
        if let Some(record) = current.and_then(|name| directory.get(name)) {
            let mut blocked = ToolChangedBlock::new(context);
            restore_tool(record, &mut *blocked);
        }
        self.active_tool = context.active_tool();
    }
}

fn preset_options(directory: &DeviceDirectory, current: Option<&str>) -> Option<ToolOptions> {
    current
        .and_then(|name| directory.get(name))
        .map(|record| record.preset().options().clone())
}
