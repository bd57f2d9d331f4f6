use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::hash_map::{Entry, Keys};

use crate::{
    DefineProperty, DefineUpdate, Device, DeviceMap, Element, ElementChange, ElementStore,
    Property, PropertyRef, PropertyRemove, PropertyUpdate, UpdateProperty, ValueUpdate,
};

/// Local mirror of the remote device -> property -> element tree.
///
/// Holds at most one property per (device, property) key and at most one
/// element per (device, property, element) key. All mutation goes through
/// the `apply_*` methods which report what changed.
#[derive(Default, Clone, Debug, Serialize)]
pub struct PropertyTree {
    devices: DeviceMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_snapshot: Option<DateTime<Utc>>,
}

impl PropertyTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or fully replaces a property. Applying the same definition twice
    /// leaves the tree as applying it once.
    pub fn apply_define(&mut self, def: DefineProperty) -> DefineUpdate {
        let property = Property {
            label: label_or_name(def.label, &def.name),
            group: def.group,
            state: def.state,
            kind: def.kind,
            elements: def
                .elements
                .into_iter()
                .map(|e| {
                    let label = label_or_name(e.label, &e.name);
                    (e.name, Element::new(label, e.text))
                })
                .collect::<ElementStore>(),
        };

        let device_created = !self.devices.contains_key(&def.device);
        let device = self.devices.entry(def.device).or_default();
        match device.properties.entry(def.name) {
            Entry::Occupied(mut entry) => {
                if *entry.get() == property {
                    DefineUpdate::NoChange
                } else {
                    entry.insert(property);
                    DefineUpdate::Replaced
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(property);
                DefineUpdate::Added { device_created }
            }
        }
    }

    /// Applies the supplied state and element texts to an existing property.
    /// Elements not mentioned keep their values; unknown targets change nothing.
    pub fn apply_update(&mut self, update: &UpdateProperty) -> PropertyUpdate {
        let Some(property) = self
            .devices
            .get_mut(&update.device)
            .and_then(|d| d.properties.get_mut(&update.name))
        else {
            return PropertyUpdate::NotFound;
        };

        let state = match update.state {
            Some(new) if new != property.state => {
                let old = property.state;
                property.state = new;
                Some((old, new))
            }
            _ => None,
        };

        let mut elements = Vec::new();
        let mut unknown_elements = Vec::new();
        for value in &update.elements {
            match property.elements.store_text(&value.name, &value.text) {
                ValueUpdate::Changed { old, new } => elements.push(ElementChange {
                    element: value.name.clone(),
                    from: old,
                    to: new,
                }),
                ValueUpdate::Equal => {}
                ValueUpdate::Unknown => unknown_elements.push(value.name.clone()),
            }
        }

        PropertyUpdate::Applied {
            state,
            elements,
            unknown_elements,
        }
    }

    pub fn apply_delete(&mut self, device: &str, property: &str) -> PropertyRemove {
        match self
            .devices
            .get_mut(device)
            .and_then(|d| d.properties.remove(property))
        {
            Some(_) => PropertyRemove::Removed,
            None => PropertyRemove::NotFound,
        }
    }

    pub fn remove_device(&mut self, device: &str) -> PropertyRemove {
        match self.devices.remove(device) {
            Some(dev) => PropertyRemove::DeviceRemoved {
                properties: dev.property_count(),
            },
            None => PropertyRemove::NotFound,
        }
    }

    /// Replaces the properties of one device wholesale and returns the previous content.
    /// Empty labels fall back to the name, as with `apply_define`.
    pub fn replace_device(&mut self, name: String, mut device: Device) -> Option<Device> {
        for (prop_name, property) in device.properties.iter_mut() {
            fill_label(&mut property.label, prop_name);
            for (element_name, element) in property.elements.iter_mut() {
                fill_label(&mut element.label, element_name);
            }
        }
        self.devices.insert(name, device)
    }

    pub fn mark_snapshot(&mut self) {
        self.last_snapshot = Some(Utc::now());
    }

    pub fn last_snapshot(&self) -> Option<DateTime<Utc>> {
        self.last_snapshot
    }

    pub fn get_device(&self, device: &str) -> Option<&Device> {
        self.devices.get(device)
    }

    pub fn get_property(&self, prop: &PropertyRef) -> Option<&Property> {
        self.devices
            .get(&prop.device)
            .and_then(|d| d.properties.get(&prop.property))
    }

    pub fn element_text(&self, prop: &PropertyRef, element: &str) -> Option<&str> {
        self.get_property(prop).and_then(|p| p.elements.text(element))
    }

    pub fn contains_device(&self, device: &str) -> bool {
        self.devices.contains_key(device)
    }

    pub fn contains_property(&self, prop: &PropertyRef) -> bool {
        self.get_property(prop).is_some()
    }

    pub fn device_names(&self) -> Keys<'_, String, Device> {
        self.devices.keys()
    }

    pub fn devices(&self) -> &DeviceMap {
        &self.devices
    }

    pub fn clear(&mut self) {
        log::debug!("Clearing all devices!");
        self.devices.clear();
        self.last_snapshot = None;
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn count(&self) -> usize {
        self.devices.len()
    }

    pub fn property_count(&self) -> usize {
        self.devices.values().map(Device::property_count).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PropertyRef, &Property)> + '_ {
        self.devices.iter().flat_map(|(device, dev)| {
            dev.properties
                .iter()
                .map(move |(name, prop)| (PropertyRef::new(device, name), prop))
        })
    }
}

fn label_or_name(label: String, name: &str) -> String {
    if label.is_empty() {
        name.to_owned()
    } else {
        label
    }
}

fn fill_label(label: &mut String, name: &str) {
    if label.is_empty() {
        name.clone_into(label);
    }
}
