//! Tool descriptors.

use super::options::ToolOptions;

/// A selectable tool and the settings bundle it owns.
///
/// Cloning a `ToolInfo` is cheap and the clone shares the same options
/// bundle, so any clone can be used to edit the tool's live settings.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    name: String,
    options: ToolOptions,
}

impl ToolInfo {
    pub fn new(name: impl Into<String>, options: ToolOptions) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The tool's live settings bundle.
    pub fn options(&self) -> &ToolOptions {
        &self.options
    }
}

/// Two descriptors are the same tool when they share a name.
impl PartialEq for ToolInfo {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ToolInfo {}
