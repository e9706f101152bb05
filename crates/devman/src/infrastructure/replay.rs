//! Session replay: drives a [`DeviceManager`] from a TOML script.
//!
//! A script declares the host's tools and displays, then lists the steps a
//! user (or the windowing system) takes:
//!
//! ```toml
//! [[tools]]
//! name = "paintbrush"
//! default = true
//! options = { size = 10, opacity = 1.0 }
//!
//! [[displays]]
//! name = ":0"
//! open = true
//! devices = [
//!     { name = "Virtual core pointer", id = 2, core_pointer = true },
//!     { name = "Wacom Pen stylus", id = 10, kind = "pen" },
//! ]
//!
//! [[steps]]
//! action = "select-device"
//! device = "Wacom Pen stylus"
//!
//! [[steps]]
//! action = "set-option"
//! key = "size"
//! value = 3
//! ```
//!
//! Each step acts on the [`MemoryHost`]; the events it queues are then
//! drained into [`DeviceManager::handle_event`] before the next step.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use devman_core::{Device, DeviceId, DeviceKind, OptionValue, ToolInfo, ToolOptions};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::application::device_manager::DeviceManager;
use crate::application::host::ToolContext;
use crate::infrastructure::host::MemoryHost;
use crate::infrastructure::storage::config::DevicesConfig;

/// Errors raised while loading or replaying a script.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("I/O error reading script {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse script TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("display {0:?} is not declared in the script")]
    UnknownDisplay(String),

    #[error("no tool named {0:?}")]
    UnknownTool(String),

    #[error("no device named {0:?}")]
    UnknownDevice(String),

    #[error("no tool is active")]
    NoActiveTool,

    /// A step of [`Session::run`] failed; `step` counts from 1.
    #[error("step {step} failed: {source}")]
    Step {
        step: usize,
        #[source]
        source: Box<ReplayError>,
    },
}

// ── Script schema ─────────────────────────────────────────────────────────────

/// A parsed replay script.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub tools: Vec<ToolSpec>,
    #[serde(default)]
    pub displays: Vec<DisplaySpec>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub options: BTreeMap<String, OptionValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplaySpec {
    pub name: String,
    /// Already open when the manager starts.
    #[serde(default)]
    pub open: bool,
    #[serde(default)]
    pub devices: Vec<DeviceSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceSpec {
    pub name: String,
    pub id: DeviceId,
    #[serde(default)]
    pub kind: DeviceKind,
    #[serde(default)]
    pub core_pointer: bool,
}

impl DeviceSpec {
    fn to_device(&self) -> Device {
        Device::new(self.id, self.name.clone(), self.kind)
    }
}

/// One scripted action.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Step {
    OpenDisplay {
        display: String,
    },
    CloseDisplay {
        display: String,
    },
    Plug {
        display: String,
        name: String,
        id: DeviceId,
        #[serde(default)]
        kind: DeviceKind,
    },
    Unplug {
        display: String,
        name: String,
    },
    /// The user picks a tool.
    SelectTool {
        tool: String,
    },
    /// The user edits a setting of the active tool.
    SetOption {
        key: String,
        value: OptionValue,
    },
    /// The user moves a different device over the canvas.
    SelectDevice {
        device: String,
    },
    ShareTool {
        value: bool,
    },
}

/// Parses a script from TOML text.
///
/// # Errors
///
/// Returns [`ReplayError::Parse`] if the TOML is malformed or does not match
/// the script schema.
pub fn parse_script(content: &str) -> Result<Script, ReplayError> {
    Ok(toml::from_str(content)?)
}

/// Reads and parses the script at `path`.
///
/// # Errors
///
/// Returns [`ReplayError::Io`] if the file cannot be read, or
/// [`ReplayError::Parse`] if its content is not a valid script.
pub fn load_script(path: &Path) -> Result<Script, ReplayError> {
    let content = std::fs::read_to_string(path).map_err(|source| ReplayError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_script(&content)
}

// ── Session ───────────────────────────────────────────────────────────────────

/// A manager wired to an in-memory host built from a script.
pub struct Session {
    host: MemoryHost,
    manager: DeviceManager,
}

impl Session {
    /// Builds the host from the script's declarations and starts the manager.
    ///
    /// `devices.default_tool`, when set, overrides the script's default tool.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::UnknownTool`] if the configured default tool is
    /// not declared.
    pub fn new(script: &Script, devices: &DevicesConfig) -> Result<Self, ReplayError> {
        let host = MemoryHost::new();

        for tool in &script.tools {
            let options = ToolOptions::from_values(tool.options.clone());
            let default = match &devices.default_tool {
                Some(name) => *name == tool.name,
                None => tool.default,
            };
            host.add_tool(ToolInfo::new(tool.name.clone(), options), default);
        }
        if let Some(name) = &devices.default_tool {
            if host.lookup_tool(name).is_none() {
                return Err(ReplayError::UnknownTool(name.clone()));
            }
        }

        for display in &script.displays {
            let core_pointer = display
                .devices
                .iter()
                .find(|d| d.core_pointer)
                .map(DeviceSpec::to_device);
            let listed = display.devices.iter().map(DeviceSpec::to_device).collect();
            host.add_display(&display.name, listed, core_pointer);
            if display.open {
                host.preopen_display(&display.name);
            }
        }

        let manager = DeviceManager::new(
            devices.share_tool,
            Box::new(host.clone()),
            Box::new(host.clone()),
        );
        let mut session = Self { host, manager };
        session.pump();
        Ok(session)
    }

    pub fn host(&self) -> &MemoryHost {
        &self.host
    }

    pub fn manager(&self) -> &DeviceManager {
        &self.manager
    }

    /// Applies every step of `script` in order, calling `after_step` once
    /// each step's events have been delivered.
    ///
    /// # Errors
    ///
    /// Stops at the first failing step and returns [`ReplayError::Step`]
    /// wrapping its error.
    pub fn run(
        &mut self,
        script: &Script,
        mut after_step: impl FnMut(&Session),
    ) -> Result<(), ReplayError> {
        for (index, step) in script.steps.iter().enumerate() {
            self.apply(step).map_err(|source| ReplayError::Step {
                step: index + 1,
                source: Box::new(source),
            })?;
            after_step(self);
        }
        Ok(())
    }

    /// Performs one step on the host, then delivers the resulting events.
    ///
    /// # Errors
    ///
    /// Returns an error naming the display, device or tool the step refers
    /// to when the host does not know it.  Nothing is delivered in that case.
    pub fn apply(&mut self, step: &Step) -> Result<(), ReplayError> {
        debug!(?step, "applying step");
        match step {
            Step::OpenDisplay { display } => {
                if !self.host.open_display(display) {
                    return Err(ReplayError::UnknownDisplay(display.clone()));
                }
            }
            Step::CloseDisplay { display } => {
                if !self.host.close_display(display) {
                    return Err(ReplayError::UnknownDisplay(display.clone()));
                }
            }
            Step::Plug {
                display,
                name,
                id,
                kind,
            } => {
                if !self.host.plug(display, Device::new(*id, name.clone(), *kind)) {
                    return Err(ReplayError::UnknownDisplay(display.clone()));
                }
            }
            Step::Unplug { display, name } => {
                if self.host.unplug(display, name).is_none() {
                    return Err(ReplayError::UnknownDevice(name.clone()));
                }
            }
            Step::SelectTool { tool } => {
                if !self.host.select_tool(tool) {
                    return Err(ReplayError::UnknownTool(tool.clone()));
                }
            }
            Step::SetOption { key, value } => {
                let tool = self.host.active_tool().ok_or(ReplayError::NoActiveTool)?;
                tool.options().set(key, value.clone());
            }
            Step::SelectDevice { device } => {
                if !self.manager.directory().contains(device) {
                    return Err(ReplayError::UnknownDevice(device.clone()));
                }
                self.manager.set_current_device(device);
            }
            Step::ShareTool { value } => self.host.set_share_tool(*value),
        }
        self.pump();
        Ok(())
    }

    /// Delivers every queued host event to the manager.  Returns how many
    /// were delivered.
    pub fn pump(&mut self) -> usize {
        let mut delivered = 0;
        while let Some(event) = self.host.next_event() {
            self.manager.handle_event(event);
            delivered += 1;
        }
        if delivered > 0 {
            debug!(delivered, "host events delivered");
        }
        delivered
    }

    /// Logs a one-line summary of the manager's state.
    pub fn log_state(&self) {
        let current = self.manager.current_device().map(|r| r.name().to_owned());
        let tool = self.manager.active_tool().map(|t| t.name().to_owned());
        info!(
            current = current.as_deref().unwrap_or("<none>"),
            tool = tool.as_deref().unwrap_or("<none>"),
            devices = self.manager.directory().len(),
            linked = self.manager.is_tool_connected(),
            "session state"
        );
    }
}
