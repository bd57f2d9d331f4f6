use std::collections::HashSet;

use crate::{
    DefineProperty, DefineUpdate, DeleteProperty, DeviceMap, IndiEvent, PropertyRef,
    PropertyRemove, PropertyTree, PropertyUpdate, TreeChange, UpdateProperty,
};

/// Applies incoming events to a [`PropertyTree`] and turns the outcome into
/// [`TreeChange`] notifications. Holds no state of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reconciler;

impl Reconciler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle_event(&self, event: IndiEvent, tree: &mut PropertyTree) -> Vec<TreeChange> {
        match event {
            IndiEvent::Define(def) => self.define(def, tree),
            IndiEvent::Update(update) => self.update(&update, tree),
            IndiEvent::Delete(del) => self.delete(&del, tree),
            IndiEvent::Snapshot(devices) => self.snapshot(devices, tree),
        }
    }

    fn define(&self, def: DefineProperty, tree: &mut PropertyTree) -> Vec<TreeChange> {
        let prop = def.prop_ref();
        match tree.apply_define(def) {
            DefineUpdate::Added { device_created } => {
                log::trace!("Defined property: {}", prop);
                let mut changes = Vec::with_capacity(2);
                if device_created {
                    changes.push(TreeChange::DeviceAdded {
                        device: prop.device.clone(),
                    });
                }
                changes.push(TreeChange::PropertyDefined {
                    prop,
                    replaced: false,
                });
                changes
            }
            DefineUpdate::Replaced => {
                log::trace!("Redefined property: {}", prop);
                vec![TreeChange::PropertyDefined {
                    prop,
                    replaced: true,
                }]
            }
            DefineUpdate::NoChange => Vec::new(),
        }
    }

    fn update(&self, update: &UpdateProperty, tree: &mut PropertyTree) -> Vec<TreeChange> {
        let prop = update.prop_ref();
        let PropertyUpdate::Applied {
            state,
            elements,
            unknown_elements,
        } = tree.apply_update(update)
        else {
            log::debug!("Dropping update for undefined property {}", prop);
            return Vec::new();
        };

        if !unknown_elements.is_empty() {
            log::debug!(
                "Ignoring undefined elements {:?} in update for {}",
                unknown_elements,
                prop
            );
        }

        let mut changes = Vec::with_capacity(elements.len() + 1);
        if let Some((from, to)) = state {
            changes.push(TreeChange::StateChanged {
                prop: prop.clone(),
                from,
                to,
            });
        }
        changes.extend(elements.into_iter().map(|e| TreeChange::ElementChanged {
            prop: prop.clone(),
            element: e.element,
            from: e.from,
            to: e.to,
        }));
        changes
    }

    fn delete(&self, del: &DeleteProperty, tree: &mut PropertyTree) -> Vec<TreeChange> {
        let outcome = match &del.name {
            Some(name) => tree.apply_delete(&del.device, name),
            None => tree.remove_device(&del.device),
        };
        match (outcome, &del.name) {
            (PropertyRemove::Removed, Some(name)) => {
                log::trace!("Deleted property: {}.{}", del.device, name);
                vec![TreeChange::PropertyRemoved {
                    prop: PropertyRef::new(&del.device, name),
                }]
            }
            (PropertyRemove::DeviceRemoved { properties }, _) => {
                log::info!(
                    "Removed device {} with {} properties",
                    del.device,
                    properties
                );
                vec![TreeChange::DeviceRemoved {
                    device: del.device.clone(),
                }]
            }
            _ => {
                log::debug!(
                    "Dropping delete for unknown target {}.{}",
                    del.device,
                    del.name.as_deref().unwrap_or("*")
                );
                Vec::new()
            }
        }
    }

    /// Upserts every device of the snapshot wholesale, then prunes devices the
    /// snapshot no longer contains. The snapshot is a complete view, so it wins
    /// for every field it carries.
    fn snapshot(&self, mut devices: DeviceMap, tree: &mut PropertyTree) -> Vec<TreeChange> {
        let incoming: HashSet<String> = devices.keys().cloned().collect();
        let mut changes = Vec::new();

        let mut names: Vec<String> = devices.keys().cloned().collect();
        names.sort();
        for name in names {
            let Some(device) = devices.remove(&name) else {
                continue;
            };
            let previous = tree.replace_device(name.clone(), device);
            let Some(previous) = previous else {
                changes.push(TreeChange::DeviceAdded {
                    device: name.clone(),
                });
                if let Some(current) = tree.get_device(&name) {
                    let mut props: Vec<&String> = current.properties.keys().collect();
                    props.sort();
                    changes.extend(props.into_iter().map(|p| TreeChange::PropertyDefined {
                        prop: PropertyRef::new(&name, p),
                        replaced: false,
                    }));
                }
                continue;
            };

            changes.push(TreeChange::DeviceRetained {
                device: name.clone(),
            });
            let Some(current) = tree.get_device(&name) else {
                continue;
            };
            let mut props: Vec<&String> = current.properties.keys().collect();
            props.sort();
            for p in props {
                match previous.properties.get(p) {
                    Some(old) if Some(old) == current.properties.get(p) => {}
                    Some(_) => changes.push(TreeChange::PropertyDefined {
                        prop: PropertyRef::new(&name, p),
                        replaced: true,
                    }),
                    None => changes.push(TreeChange::PropertyDefined {
                        prop: PropertyRef::new(&name, p),
                        replaced: false,
                    }),
                }
            }
            let mut removed: Vec<&String> = previous
                .properties
                .keys()
                .filter(|p| !current.properties.contains_key(*p))
                .collect();
            removed.sort();
            changes.extend(removed.into_iter().map(|p| TreeChange::PropertyRemoved {
                prop: PropertyRef::new(&name, p),
            }));
        }

        let mut stale: Vec<String> = tree
            .device_names()
            .filter(|d| !incoming.contains(*d))
            .cloned()
            .collect();
        stale.sort();
        for device in stale {
            tree.remove_device(&device);
            changes.push(TreeChange::DeviceRemoved { device });
        }

        tree.mark_snapshot();
        changes
    }
}
