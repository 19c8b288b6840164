use serde::{Deserialize, Serialize};

use super::navigation::{AccessRequirement, IconRef, NavigationItem, SectionKind};

/// A registered business module with its own contextual sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub icon: IconRef,
    pub base_path: String,
    /// Requirement for the module's entry in the main sidebar
    #[serde(default)]
    pub required: AccessRequirement,
    #[serde(default)]
    pub sections: Vec<ModuleSection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSection {
    pub title: String,
    #[serde(default)]
    pub collapsible_default: bool,
    #[serde(default)]
    pub items: Vec<NavigationItem>,
}

impl ModuleDescriptor {
    /// The item that represents this module in the main sidebar.
    pub fn entry_item(&self) -> NavigationItem {
        NavigationItem::new(self.label.clone(), self.base_path.clone(), SectionKind::Modules)
            .icon(self.icon)
            .requires(self.required.clone())
    }

    pub fn items(&self) -> impl Iterator<Item = &NavigationItem> {
        self.sections.iter().flat_map(|section| section.items.iter())
    }
}

/// A module's sidebar after visibility filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSidebar {
    pub key: String,
    pub label: String,
    pub icon: IconRef,
    pub base_path: String,
    pub sections: Vec<ModuleSection>,
}
