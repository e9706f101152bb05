//! Notifications delivered by the host to the device manager.

use super::device::Device;
use super::tool::ToolInfo;

/// Configuration flags the device manager observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFlag {
    /// "Devices share tool options" vs. "each device keeps its own".
    DevicesShareTool,
}

/// A host notification.  Delivery is synchronous and in order.
#[derive(Debug, Clone)]
pub enum HostEvent {
    /// A display connection was opened.
    DisplayOpened { display: String },
    /// A display connection was closed.
    DisplayClosed { display: String },
    /// A device was plugged in on `display`.
    DeviceAdded { display: String, device: Device },
    /// A device was unplugged from `display`.
    DeviceRemoved { display: String, device: Device },
    /// The user selected a different tool.
    ToolChanged { tool: ToolInfo },
    /// A boolean configuration flag changed.
    ConfigChanged { flag: ConfigFlag, value: bool },
}
