//! Input devices and the persistent records kept for them.
//!
//! A [`Device`] is the live handle the windowing system hands out while a
//! device is plugged in.  A [`DeviceRecord`] outlives it: when the device
//! disappears the record only forgets the handle, keeping the tool preset so
//! the settings come back when the device is plugged in again.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::options::ToolOptions;
use super::tool::ToolInfo;

/// Host handle identifying a live device on one display connection.
pub type DeviceId = u64;

/// Broad category of an input device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceKind {
    #[default]
    Mouse,
    Pen,
    Eraser,
    /// Puck or lens cursor on a tablet.
    Cursor,
    Touchpad,
    Keyboard,
    Other,
}

/// A live device as reported by the windowing system.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub kind: DeviceKind,
}

impl Device {
    pub fn new(id: DeviceId, name: impl Into<String>, kind: DeviceKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
        }
    }
}

/// Tool settings saved for one device.
#[derive(Debug, Clone, Default)]
pub struct ToolPreset {
    tool: Option<String>,
    options: ToolOptions,
}

impl ToolPreset {
    /// Captures `tool` with a private copy of its current options.
    pub fn capture(tool: &ToolInfo) -> Self {
        Self {
            tool: Some(tool.name().to_owned()),
            options: tool.options().duplicate(),
        }
    }

    /// Name of the saved tool, if one has been stored.
    pub fn tool_name(&self) -> Option<&str> {
        self.tool.as_deref()
    }

    /// The preset's own settings bundle.
    pub fn options(&self) -> &ToolOptions {
        &self.options
    }
}

/// Persistent per-device state, keyed by device name.
#[derive(Debug)]
pub struct DeviceRecord {
    name: String,
    device: Option<Device>,
    display: Option<String>,
    core_pointer: bool,
    preset: ToolPreset,
}

impl DeviceRecord {
    /// Creates a record for a device that just appeared on `display`.
    ///
    /// The preset starts empty; see [`set_default_tool`](Self::set_default_tool).
    pub fn new(device: Device, display: &str, core_pointer: bool) -> Self {
        Self {
            name: device.name.clone(),
            device: Some(device),
            display: Some(display.to_owned()),
            core_pointer,
            preset: ToolPreset::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The live handle, or `None` while the device is unplugged.
    pub fn device(&self) -> Option<&Device> {
        self.device.as_ref()
    }

    pub fn display(&self) -> Option<&str> {
        self.display.as_deref()
    }

    pub fn is_present(&self) -> bool {
        self.device.is_some()
    }

    /// `true` while the record is bound as its display's core pointer.
    pub fn is_core_pointer(&self) -> bool {
        self.core_pointer && self.device.is_some()
    }

    pub fn preset(&self) -> &ToolPreset {
        &self.preset
    }

    /// Rebinds the record to a live device (the device reappeared).
    pub fn bind(&mut self, device: Device, display: &str, core_pointer: bool) {
        debug_assert_eq!(device.name, self.name, "record rebound to a different device");
        self.device = Some(device);
        self.display = Some(display.to_owned());
        self.core_pointer = core_pointer;
    }

    /// Forgets the live device; the preset is kept.
    pub fn unbind(&mut self) {
        self.device = None;
        self.display = None;
        self.core_pointer = false;
    }

    /// Gives a freshly created record the context's default tool.
    pub fn set_default_tool(&mut self, tool: &ToolInfo) {
        self.save_tool(tool);
    }

    /// Stores `tool` and a copy of its current settings as this device's preset.
    pub fn save_tool(&mut self, tool: &ToolInfo) {
        self.preset = ToolPreset::capture(tool);
    }
}

/// Default directory ordering: the core pointer first, then devices that are
/// plugged in, then absent devices; ties are broken by name.
pub fn compare_records(a: &DeviceRecord, b: &DeviceRecord) -> Ordering {
    b.is_core_pointer()
        .cmp(&a.is_core_pointer())
        .then_with(|| b.is_present().cmp(&a.is_present()))
        .then_with(|| a.name.cmp(&b.name))
}
