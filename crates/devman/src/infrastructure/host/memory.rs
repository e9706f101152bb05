//! In-memory host for replays and tests.
//!
//! [`MemoryHost`] plays both collaborator roles: it is the display server
//! and the tool context.  Host-side actions (`open_display`, `plug`,
//! `select_tool`, ...) change its state and queue the [`HostEvent`] a real
//! windowing system would deliver; callers drain the queue into
//! [`DeviceManager::handle_event`](crate::application::device_manager::DeviceManager::handle_event).
//!
//! Clones share state, so a test can keep a handle after boxing one copy
//! into the manager.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use devman_core::{ConfigFlag, Device, HostEvent, ToolInfo};

use crate::application::host::{DisplayServer, ToolContext};

#[derive(Debug)]
struct MemoryDisplay {
    name: String,
    handles: u32,
    devices: Vec<Device>,
    /// Stays set while unplugged; [`DisplayServer::core_pointer`] still
    /// reports it so the manager can fall back to its record.
    core_pointer: Option<Device>,
    core_unplugged: bool,
}

impl MemoryDisplay {
    fn is_core_pointer(&self, name: &str) -> bool {
        self.core_pointer.as_ref().is_some_and(|core| core.name == name)
    }
}

#[derive(Debug, Default)]
struct HostState {
    /// In the order they were first opened.
    displays: Vec<MemoryDisplay>,
    default_display: Option<String>,
    tools: Vec<ToolInfo>,
    default_tool: Option<String>,
    active_tool: Option<ToolInfo>,
    blocked: u32,
    pending: VecDeque<HostEvent>,
    tool_changed_emitted: usize,
    tool_changed_suppressed: usize,
}

impl HostState {
    fn display_mut(&mut self, name: &str) -> Option<&mut MemoryDisplay> {
        self.displays.iter_mut().find(|d| d.name == name)
    }

    fn display(&self, name: &str) -> Option<&MemoryDisplay> {
        self.displays.iter().find(|d| d.name == name)
    }
}

/// Shared in-memory display server and tool context.
#[derive(Clone, Default)]
pub struct MemoryHost {
    state: Rc<RefCell<HostState>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Setup (no events) ─────────────────────────────────────────────────────

    /// Registers a tool.  The first tool registered, or any registered with
    /// `default == true`, becomes the default tool; the default tool is also
    /// made active if nothing is active yet.
    pub fn add_tool(&self, tool: ToolInfo, default: bool) {
        let mut state = self.state.borrow_mut();
        if default || state.default_tool.is_none() {
            state.default_tool = Some(tool.name().to_owned());
        }
        if state.active_tool.is_none() || default {
            state.active_tool = Some(tool.clone());
        }
        state.tools.retain(|t| t.name() != tool.name());
        state.tools.push(tool);
    }

    /// Declares a display and its devices without opening it.
    pub fn add_display(&self, name: &str, devices: Vec<Device>, core_pointer: Option<Device>) {
        let mut state = self.state.borrow_mut();
        if let Some(display) = state.display_mut(name) {
            display.devices = devices;
            display.core_pointer = core_pointer;
            display.core_unplugged = false;
            return;
        }
        state.displays.push(MemoryDisplay {
            name: name.to_owned(),
            handles: 0,
            devices,
            core_pointer,
            core_unplugged: false,
        });
    }

    /// Marks a declared display as already open, as if opened before the
    /// manager existed.  Queues nothing.
    pub fn preopen_display(&self, name: &str) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(display) = state.display_mut(name) else {
            return false;
        };
        display.handles += 1;
        if state.default_display.is_none() {
            state.default_display = Some(name.to_owned());
        }
        true
    }

    // ── Host actions (queue events) ───────────────────────────────────────────

    /// Opens one more handle to a declared display.
    pub fn open_display(&self, name: &str) -> bool {
        if !self.preopen_display(name) {
            return false;
        }
        self.push(HostEvent::DisplayOpened {
            display: name.to_owned(),
        });
        true
    }

    /// Closes one handle to a display.  The display stays declared so its
    /// devices can still be listed while the close is processed.
    pub fn close_display(&self, name: &str) -> bool {
        {
            let mut state = self.state.borrow_mut();
            let Some(display) = state.display_mut(name) else {
                return false;
            };
            display.handles = display.handles.saturating_sub(1);
            let closed = display.handles == 0;
            if closed && state.default_display.as_deref() == Some(name) {
                let next = state
                    .displays
                    .iter()
                    .find(|d| d.handles > 0)
                    .map(|d| d.name.clone());
                state.default_display = next;
            }
        }
        self.push(HostEvent::DisplayClosed {
            display: name.to_owned(),
        });
        true
    }

    /// Plugs `device` into `display`.
    pub fn plug(&self, display: &str, device: Device) -> bool {
        {
            let mut state = self.state.borrow_mut();
            let Some(target) = state.display_mut(display) else {
                return false;
            };
            if target.is_core_pointer(&device.name) {
                target.core_unplugged = false;
            }
            target.devices.retain(|d| d.name != device.name);
            target.devices.push(device.clone());
        }
        self.push(HostEvent::DeviceAdded {
            display: display.to_owned(),
            device,
        });
        true
    }

    /// Unplugs the device called `name` from `display`.  The core pointer
    /// can be unplugged whether or not it was listed among the devices.
    pub fn unplug(&self, display: &str, name: &str) -> Option<Device> {
        let device = {
            let mut state = self.state.borrow_mut();
            let target = state.display_mut(display)?;
            let listed = target
                .devices
                .iter()
                .position(|d| d.name == name)
                .map(|index| target.devices.remove(index));
            if target.is_core_pointer(name) && !target.core_unplugged {
                target.core_unplugged = true;
                listed.or_else(|| target.core_pointer.clone())?
            } else {
                listed?
            }
        };
        self.push(HostEvent::DeviceRemoved {
            display: display.to_owned(),
            device: device.clone(),
        });
        Some(device)
    }

    /// The user picks the tool called `name`.
    pub fn select_tool(&self, name: &str) -> bool {
        let Some(tool) = self.lookup_tool(name) else {
            return false;
        };
        let mut context = self.clone();
        context.set_active_tool(&tool);
        true
    }

    /// The user flips the "devices share tool" preference.
    pub fn set_share_tool(&self, value: bool) {
        self.push(HostEvent::ConfigChanged {
            flag: ConfigFlag::DevicesShareTool,
            value,
        });
    }

    // ── Inspection ────────────────────────────────────────────────────────────

    /// Removes and returns the oldest queued event.
    pub fn next_event(&self) -> Option<HostEvent> {
        self.state.borrow_mut().pending.pop_front()
    }

    pub fn pending_events(&self) -> usize {
        self.state.borrow().pending.len()
    }

    /// Tool-changed notifications queued so far.
    pub fn tool_changed_emitted(&self) -> usize {
        self.state.borrow().tool_changed_emitted
    }

    /// Active tool changes that happened while notifications were blocked.
    pub fn tool_changed_suppressed(&self) -> usize {
        self.state.borrow().tool_changed_suppressed
    }

    pub fn is_tool_changed_blocked(&self) -> bool {
        self.state.borrow().blocked > 0
    }

    fn push(&self, event: HostEvent) {
        self.state.borrow_mut().pending.push_back(event);
    }
}

impl DisplayServer for MemoryHost {
    fn list_displays(&self) -> Vec<String> {
        self.state
            .borrow()
            .displays
            .iter()
            .filter(|d| d.handles > 0)
            .map(|d| d.name.clone())
            .collect()
    }

    fn default_display(&self) -> Option<String> {
        self.state.borrow().default_display.clone()
    }

    fn list_devices(&self, display: &str) -> Vec<Device> {
        let state = self.state.borrow();
        let Some(display) = state.display(display) else {
            return Vec::new();
        };
        let mut devices = display.devices.clone();
        if let Some(core) = display.core_pointer.as_ref().filter(|_| !display.core_unplugged) {
            if !devices.iter().any(|d| d.name == core.name) {
                devices.insert(0, core.clone());
            }
        }
        devices
    }

    fn core_pointer(&self, display: &str) -> Option<Device> {
        self.state
            .borrow()
            .display(display)
            .and_then(|d| d.core_pointer.clone())
    }
}

impl ToolContext for MemoryHost {
    fn active_tool(&self) -> Option<ToolInfo> {
        self.state.borrow().active_tool.clone()
    }

    fn default_tool(&self) -> Option<ToolInfo> {
        let state = self.state.borrow();
        let name = state.default_tool.as_deref()?;
        state.tools.iter().find(|t| t.name() == name).cloned()
    }

    fn lookup_tool(&self, name: &str) -> Option<ToolInfo> {
        self.state
            .borrow()
            .tools
            .iter()
            .find(|t| t.name() == name)
            .cloned()
    }

    /// Changing to the tool that is already active emits nothing.
    fn set_active_tool(&mut self, tool: &ToolInfo) {
        let mut state = self.state.borrow_mut();
        if state.active_tool.as_ref() == Some(tool) {
            return;
        }
        state.active_tool = Some(tool.clone());
        if state.blocked > 0 {
            state.tool_changed_suppressed += 1;
        } else {
            state.tool_changed_emitted += 1;
            state
                .pending
                .push_back(HostEvent::ToolChanged { tool: tool.clone() });
        }
    }

    fn block_tool_changed(&mut self) {
        self.state.borrow_mut().blocked += 1;
    }

    fn unblock_tool_changed(&mut self) {
        let mut state = self.state.borrow_mut();
        debug_assert!(state.blocked > 0, "unbalanced unblock_tool_changed");
        state.blocked = state.blocked.saturating_sub(1);
    }
}
