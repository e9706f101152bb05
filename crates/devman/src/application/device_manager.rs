//! DeviceManager: tracks devices across displays and owns the current device.
//!
//! The manager is the integration point for every host notification:
//!
//! ```text
//!  DisplayOpened ─► DisplayRegistry ─(first open)─► device_added  (each device)
//!  DisplayClosed ─► DisplayRegistry ─(last close)─► device_removed (each device)
//!  DeviceAdded   ─► DeviceDirectory  (create record or rebind it)
//!  DeviceRemoved ─► DeviceDirectory  (unbind record) ─(was current)─► core pointer
//!  ToolChanged   ─► ToolBinding
//!  ConfigChanged ─► ToolBinding
//! ```
//!
//! Every change of the current device goes through [`DeviceManager::set_current_device`]
//! (or its internal equivalent), which moves the tool link and then notifies
//! subscribers.
//!
//! # Open question: removal of the current device
//!
//! Removing the current device does not touch the tool link directly.  The
//! fallback to the core pointer goes through the regular current-device
//! transition, which unlinks the old pair before anything else happens.

use devman_core::{
    ConfigFlag, Device, DeviceDirectory, DeviceRecord, DisplayRegistry, HostEvent, RefChange,
    ToolInfo,
};
use tracing::{debug, info, warn};

use super::host::{DisplayServer, ToolContext};
use super::tool_binding::ToolBinding;

/// Handle returned by [`DeviceManager::subscribe_current_device`].
pub type SubscriptionId = u64;

type CurrentDeviceObserver = Box<dyn FnMut(Option<&DeviceRecord>)>;

/// The device manager.
pub struct DeviceManager {
    displays: DisplayRegistry,
    directory: DeviceDirectory,
    binding: ToolBinding,
    /// Name of the current record; the directory owns the record itself.
    current: Option<String>,
    observers: Vec<(SubscriptionId, CurrentDeviceObserver)>,
    next_subscription: SubscriptionId,
    display_server: Box<dyn DisplayServer>,
    context: Box<dyn ToolContext>,
}

impl DeviceManager {
    /// Creates the manager and synchronises it with the host.
    ///
    /// Every display the server reports is opened (in the order the host
    /// opened them), then the default display's core pointer becomes the
    /// current device.
    pub fn new(
        share_tool: bool,
        display_server: Box<dyn DisplayServer>,
        context: Box<dyn ToolContext>,
    ) -> Self {
        let mut manager = Self {
            displays: DisplayRegistry::new(),
            directory: DeviceDirectory::new(),
            binding: ToolBinding::new(share_tool),
            current: None,
            observers: Vec::new(),
            next_subscription: 0,
            display_server,
            context,
        };

        for display in manager.display_server.list_displays() {
            manager.display_opened(&display);
        }

        match manager.display_server.default_display() {
            Some(display) => manager.fall_back_to_core_pointer(&display),
            None => warn!("no default display; starting without a current device"),
        }

        info!(
            devices = manager.directory.len(),
            displays = manager.displays.len(),
            share_tool,
            "device manager ready"
        );
        manager
    }

    // ── Current device ────────────────────────────────────────────────────────

    /// The current device's record.
    pub fn current_device(&self) -> Option<&DeviceRecord> {
        self.current.as_deref().and_then(|name| self.directory.get(name))
    }

    /// Makes the record called `name` the current device.
    ///
    /// `name` must be in the directory.  In release builds an unknown name is
    /// logged and ignored.
    pub fn set_current_device(&mut self, name: &str) {
        debug_assert!(
            self.directory.contains(name),
            "set_current_device: {name:?} is not in the directory"
        );
        if !self.directory.contains(name) {
            warn!(device = name, "ignoring unknown current device");
            return;
        }
        self.switch_current(name.to_owned());
    }

    /// Registers `observer`, called after every current-device change.
    pub fn subscribe_current_device(
        &mut self,
        observer: impl FnMut(Option<&DeviceRecord>) + 'static,
    ) -> SubscriptionId {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Removes a subscription.  Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sub, _)| *sub != id);
        self.observers.len() != before
    }

    // ── Read access ───────────────────────────────────────────────────────────

    pub fn directory(&self) -> &DeviceDirectory {
        &self.directory
    }

    pub fn displays(&self) -> &DisplayRegistry {
        &self.displays
    }

    pub fn active_tool(&self) -> Option<&ToolInfo> {
        self.binding.active_tool()
    }

    pub fn devices_share_tool(&self) -> bool {
        self.binding.shares_tool()
    }

    /// `true` while the active tool is linked to the current device's preset.
    pub fn is_tool_connected(&self) -> bool {
        self.binding
            .is_connected(&self.directory, self.current.as_deref())
    }

    // ── Host notifications ────────────────────────────────────────────────────

    /// Routes a host notification to its handler.
    ///
    /// Device notifications for displays that are not open are ignored: the
    /// manager only listens to displays it has enumerated.
    pub fn handle_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::DisplayOpened { display } => self.display_opened(&display),
            HostEvent::DisplayClosed { display } => self.display_closed(&display),
            HostEvent::DeviceAdded { display, device } => {
                if self.is_watched(&display, &device) {
                    self.device_added(&display, device);
                }
            }
            HostEvent::DeviceRemoved { display, device } => {
                if self.is_watched(&display, &device) {
                    self.device_removed(&display, &device);
                }
            }
            HostEvent::ToolChanged { tool } => self.tool_changed(tool),
            HostEvent::ConfigChanged { flag, value } => self.config_changed(flag, value),
        }
    }

    /// A display connection was opened.  Devices are enumerated only on the
    /// first open of a given display name.
    pub fn display_opened(&mut self, display_name: &str) {
        match self.displays.open(display_name) {
            RefChange::First => {
                info!(display = display_name, "display opened");
                for device in self.display_server.list_devices(display_name) {
                    self.device_added(display_name, device);
                }
            }
            change => debug!(display = display_name, ?change, "display already open"),
        }
    }

    /// A display connection was closed.  Devices are marked absent only on
    /// the last close.
    pub fn display_closed(&mut self, display_name: &str) {
        match self.displays.close(display_name) {
            RefChange::Last => {
                info!(display = display_name, "display closed");
                for device in self.display_server.list_devices(display_name) {
                    self.device_removed(display_name, &device);
                }
            }
            RefChange::Shared(remaining) => {
                debug!(display = display_name, remaining, "display still open");
            }
            RefChange::First | RefChange::Unknown => {
                warn!(display = display_name, "ignoring close of a display that is not open");
            }
        }
    }

    /// A device appeared on `display_name`.
    pub fn device_added(&mut self, display_name: &str, device: Device) {
        let core_pointer = self.is_core_pointer(display_name, &device);
        let name = device.name.clone();

        if self.directory.contains(&name) {
            self.directory
                .update(&name, |record| record.bind(device, display_name, core_pointer));
            info!(device = %name, display = display_name, "device reconnected");
            return;
        }

        let mut record = DeviceRecord::new(device, display_name, core_pointer);
        if let Some(tool) = self.context.default_tool() {
            record.set_default_tool(&tool);
        }
        match self.directory.insert(record) {
            Ok(()) => info!(device = %name, display = display_name, core_pointer, "new device"),
            Err(e) => warn!("failed to register device: {e}"),
        }
    }

    /// A device disappeared from `display_name`.  The record is kept; if it was
    /// the current device, the display's core pointer takes over.
    pub fn device_removed(&mut self, display_name: &str, device: &Device) {
        if self
            .directory
            .update(&device.name, DeviceRecord::unbind)
            .is_none()
        {
            debug!(device = %device.name, "removed device was never registered");
            return;
        }
        info!(device = %device.name, display = display_name, "device disconnected");

        if self.current.as_deref() == Some(device.name.as_str()) {
            self.fall_back_to_core_pointer(display_name);
        }
    }

    /// The context's active tool changed.
    pub fn tool_changed(&mut self, tool: ToolInfo) {
        self.binding
            .tool_changed(tool, &mut self.directory, self.current.as_deref());
    }

    /// A configuration flag changed.
    pub fn config_changed(&mut self, flag: ConfigFlag, value: bool) {
        match flag {
            ConfigFlag::DevicesShareTool => {
                info!(share_tool = value, "devices-share-tool changed");
                self.binding.set_share_tool(
                    value,
                    &mut self.directory,
                    self.current.as_deref(),
                    self.context.as_mut(),
                );
            }
        }
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn switch_current(&mut self, name: String) {
        self.binding
            .leave_device(&self.directory, self.current.as_deref());

        self.current = Some(name);

        self.binding.enter_device(
            &self.directory,
            self.current.as_deref(),
            self.context.as_mut(),
        );

        info!(device = self.current.as_deref(), "current device changed");
        self.notify_current_device();
    }

    fn notify_current_device(&mut self) {
        let record = self
            .current
            .as_deref()
            .and_then(|name| self.directory.get(name));
        for (_, observer) in &mut self.observers {
            observer(record);
        }
    }

    /// Makes `display_name`'s core pointer the current device, registering it
    /// first if the directory has never seen it.
    fn fall_back_to_core_pointer(&mut self, display_name: &str) {
        let core = self.display_server.core_pointer(display_name);
        debug_assert!(core.is_some(), "display {display_name:?} has no core pointer");
        let Some(core) = core else {
            warn!(
                display = display_name,
                "display has no core pointer; current device unchanged"
            );
            return;
        };

        let name = match self.directory.find_by_device(&core) {
            Some(record) => record.name().to_owned(),
            None if self.directory.contains(&core.name) => core.name.clone(),
            None => {
                let name = core.name.clone();
                self.device_added(display_name, core);
                name
            }
        };
        self.switch_current(name);
    }

    fn is_core_pointer(&self, display_name: &str, device: &Device) -> bool {
        self.display_server
            .core_pointer(display_name)
            .is_some_and(|core| core.id == device.id && core.name == device.name)
    }

    fn is_watched(&self, display_name: &str, device: &Device) -> bool {
        let watched = self.displays.is_open(display_name);
        if !watched {
            debug!(
                display = display_name,
                device = %device.name,
                "ignoring device event from unwatched display"
            );
        }
        watched
    }
}

impl Drop for DeviceManager {
    fn drop(&mut self) {
        self.binding
            .disconnect(&self.directory, self.current.as_deref());
    }
}
