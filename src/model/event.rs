use serde::{Deserialize, Serialize};

use crate::{DeviceMap, PropertyRef, PropertyState, VectorKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementDef {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub text: String,
}

impl ElementDef {
    pub fn new(name: impl Into<String>, label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            text: text.into(),
        }
    }
}

/// Full definition of a property vector. Applying it inserts or replaces the property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefineProperty {
    pub device: String,
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub state: PropertyState,
    #[serde(default)]
    pub kind: VectorKind,
    #[serde(default)]
    pub elements: Vec<ElementDef>,
}

impl DefineProperty {
    pub fn new(device: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            name: name.into(),
            label: String::new(),
            group: None,
            state: PropertyState::Idle,
            kind: VectorKind::Text,
            elements: Vec::new(),
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn state(mut self, state: PropertyState) -> Self {
        self.state = state;
        self
    }

    pub fn kind(mut self, kind: VectorKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn element(
        mut self,
        name: impl Into<String>,
        label: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        self.elements.push(ElementDef::new(name, label, text));
        self
    }

    pub fn prop_ref(&self) -> PropertyRef {
        PropertyRef::new(&self.device, &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementValue {
    pub name: String,
    pub text: String,
}

/// Partial update of an existing property: an optional new state plus a subset of element texts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProperty {
    pub device: String,
    pub name: String,
    #[serde(default)]
    pub state: Option<PropertyState>,
    #[serde(default)]
    pub elements: Vec<ElementValue>,
}

impl UpdateProperty {
    pub fn new(device: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            name: name.into(),
            state: None,
            elements: Vec::new(),
        }
    }

    pub fn state(mut self, state: PropertyState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn element(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.elements.push(ElementValue {
            name: name.into(),
            text: text.into(),
        });
        self
    }

    pub fn prop_ref(&self) -> PropertyRef {
        PropertyRef::new(&self.device, &self.name)
    }
}

/// Removal of a single property, or of the whole device when `name` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteProperty {
    pub device: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl DeleteProperty {
    pub fn property(device: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            name: Some(name.into()),
        }
    }

    pub fn device(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndiEvent {
    Define(DefineProperty),
    Update(UpdateProperty),
    Delete(DeleteProperty),
    Snapshot(DeviceMap),
}

/// Everything the push channel can deliver: link events and tree events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushEvent {
    Connected,
    Disconnected,
    Error(String),
    Message(IndiEvent),
}

/// Payload of one pull of the complete tree.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollSnapshot {
    #[serde(default)]
    pub devices: DeviceMap,
    pub is_connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_saved_image_path: Option<String>,
}

/// Out-of-band notification that an image file was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSaved {
    pub path: String,
}

impl ImageSaved {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}
