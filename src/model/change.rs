use serde::Serialize;

use crate::{JobPhase, PropertyRef, PropertyState};

pub enum ValueUpdate<T> {
    Equal,
    Changed { old: T, new: T },
    Unknown,
}

pub enum DefineUpdate {
    Added { device_created: bool },
    Replaced,
    NoChange,
}

pub enum PropertyUpdate {
    Applied {
        state: Option<(PropertyState, PropertyState)>,
        elements: Vec<ElementChange>,
        unknown_elements: Vec<String>,
    },
    NotFound,
}

pub enum PropertyRemove {
    Removed,
    DeviceRemoved { properties: usize },
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementChange {
    pub element: String,
    pub from: String,
    pub to: String,
}

/// A structured notification for the presentation layer describing one change to the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TreeChange {
    DeviceAdded {
        device: String,
    },
    /// Emitted by snapshots for devices that were already mirrored, so a view
    /// can keep whatever it attached to the device (expanded/collapsed etc).
    DeviceRetained {
        device: String,
    },
    DeviceRemoved {
        device: String,
    },
    PropertyDefined {
        prop: PropertyRef,
        replaced: bool,
    },
    PropertyRemoved {
        prop: PropertyRef,
    },
    StateChanged {
        prop: PropertyRef,
        from: PropertyState,
        to: PropertyState,
    },
    ElementChanged {
        prop: PropertyRef,
        element: String,
        from: String,
        to: String,
    },
    Cleared,
}

impl TreeChange {
    pub fn device(&self) -> Option<&str> {
        match self {
            TreeChange::DeviceAdded { device }
            | TreeChange::DeviceRetained { device }
            | TreeChange::DeviceRemoved { device } => Some(device),
            TreeChange::PropertyDefined { prop, .. }
            | TreeChange::PropertyRemoved { prop }
            | TreeChange::StateChanged { prop, .. }
            | TreeChange::ElementChanged { prop, .. } => Some(&prop.device),
            TreeChange::Cleared => None,
        }
    }
}

pub enum PhaseUpdate {
    Changed { from: JobPhase, to: JobPhase },
    Unchanged,
}
