#[cfg(test)]
mod tests {
    use hc_indi::*;

    fn exposure_define() -> DefineProperty {
        DefineProperty::new("CCD Simulator", "CCD_EXPOSURE")
            .label("Expose")
            .group("Main Control")
            .state(PropertyState::Idle)
            .kind(VectorKind::Number)
            .element("CCD_EXPOSURE_VALUE", "Duration (s)", "1")
    }

    fn temperature_define() -> DefineProperty {
        DefineProperty::new("CCD Simulator", "CCD_TEMPERATURE")
            .label("Temperature")
            .kind(VectorKind::Number)
            .element("CCD_TEMPERATURE_VALUE", "Temperature (C)", "20.0")
            .element("CCD_TEMPERATURE_RAMP", "Ramp (C/min)", "0")
    }

    fn apply(tree: &mut PropertyTree, event: IndiEvent) -> Vec<TreeChange> {
        Reconciler::new().handle_event(event, tree)
    }

    #[test]
    fn test_define_is_idempotent() {
        let mut once = PropertyTree::new();
        apply(&mut once, IndiEvent::Define(exposure_define()));

        let mut twice = PropertyTree::new();
        let first = apply(&mut twice, IndiEvent::Define(exposure_define()));
        let second = apply(&mut twice, IndiEvent::Define(exposure_define()));

        assert_eq!(once.devices(), twice.devices());
        assert_eq!(twice.property_count(), 1);
        assert_eq!(
            first,
            vec![
                TreeChange::DeviceAdded {
                    device: "CCD Simulator".to_string()
                },
                TreeChange::PropertyDefined {
                    prop: PropertyRef::new("CCD Simulator", "CCD_EXPOSURE"),
                    replaced: false
                },
            ]
        );
        assert!(second.is_empty());
    }

    #[test]
    fn test_define_replaces_whole_property() {
        let mut tree = PropertyTree::new();
        apply(&mut tree, IndiEvent::Define(temperature_define()));

        let redefined = DefineProperty::new("CCD Simulator", "CCD_TEMPERATURE")
            .state(PropertyState::Busy)
            .element("CCD_TEMPERATURE_VALUE", "", "-10.0");
        let changes = apply(&mut tree, IndiEvent::Define(redefined));

        assert_eq!(
            changes,
            vec![TreeChange::PropertyDefined {
                prop: PropertyRef::new("CCD Simulator", "CCD_TEMPERATURE"),
                replaced: true
            }]
        );
        let prop = tree
            .get_property(&PropertyRef::new("CCD Simulator", "CCD_TEMPERATURE"))
            .unwrap();
        assert_eq!(prop.state, PropertyState::Busy);
        assert_eq!(prop.elements.count(), 1);
        // empty labels fall back to the name
        assert_eq!(prop.label, "CCD_TEMPERATURE");
        assert_eq!(
            prop.elements.get("CCD_TEMPERATURE_VALUE").unwrap().label,
            "CCD_TEMPERATURE_VALUE"
        );
    }

    #[test]
    fn test_update_for_undefined_property_changes_nothing() {
        let mut tree = PropertyTree::new();
        let changes = apply(
            &mut tree,
            IndiEvent::Update(
                UpdateProperty::new("CCD Simulator", "CCD_EXPOSURE")
                    .state(PropertyState::Busy)
                    .element("CCD_EXPOSURE_VALUE", "5"),
            ),
        );
        assert!(changes.is_empty());
        assert!(tree.is_empty());
        assert!(!tree.contains_device("CCD Simulator"));

        // a known device with an unknown property stays untouched as well
        apply(&mut tree, IndiEvent::Define(temperature_define()));
        let before = tree.devices().clone();
        let changes = apply(
            &mut tree,
            IndiEvent::Update(UpdateProperty::new("CCD Simulator", "CCD_EXPOSURE")),
        );
        assert!(changes.is_empty());
        assert_eq!(&before, tree.devices());
    }

    #[test]
    fn test_update_leaves_sibling_elements_untouched() {
        let mut tree = PropertyTree::new();
        apply(&mut tree, IndiEvent::Define(temperature_define()));

        let changes = apply(
            &mut tree,
            IndiEvent::Update(
                UpdateProperty::new("CCD Simulator", "CCD_TEMPERATURE")
                    .element("CCD_TEMPERATURE_VALUE", "-5.0"),
            ),
        );

        let prop = PropertyRef::new("CCD Simulator", "CCD_TEMPERATURE");
        assert_eq!(
            changes,
            vec![TreeChange::ElementChanged {
                prop: prop.clone(),
                element: "CCD_TEMPERATURE_VALUE".to_string(),
                from: "20.0".to_string(),
                to: "-5.0".to_string(),
            }]
        );
        assert_eq!(tree.element_text(&prop, "CCD_TEMPERATURE_VALUE"), Some("-5.0"));
        assert_eq!(tree.element_text(&prop, "CCD_TEMPERATURE_RAMP"), Some("0"));
        // state was not supplied and keeps its value
        assert_eq!(tree.get_property(&prop).unwrap().state, PropertyState::Idle);
    }

    #[test]
    fn test_update_ignores_undefined_elements() {
        let mut tree = PropertyTree::new();
        apply(&mut tree, IndiEvent::Define(exposure_define()));

        let changes = apply(
            &mut tree,
            IndiEvent::Update(
                UpdateProperty::new("CCD Simulator", "CCD_EXPOSURE")
                    .state(PropertyState::Busy)
                    .element("NOT_AN_ELEMENT", "1"),
            ),
        );
        let prop = PropertyRef::new("CCD Simulator", "CCD_EXPOSURE");
        assert_eq!(
            changes,
            vec![TreeChange::StateChanged {
                prop: prop.clone(),
                from: PropertyState::Idle,
                to: PropertyState::Busy,
            }]
        );
        assert_eq!(tree.get_property(&prop).unwrap().elements.count(), 1);
    }

    #[test]
    fn test_delete_property_and_device() {
        let mut tree = PropertyTree::new();
        apply(&mut tree, IndiEvent::Define(exposure_define()));
        apply(&mut tree, IndiEvent::Define(temperature_define()));

        let changes = apply(
            &mut tree,
            IndiEvent::Delete(DeleteProperty::property("CCD Simulator", "CCD_EXPOSURE")),
        );
        assert_eq!(
            changes,
            vec![TreeChange::PropertyRemoved {
                prop: PropertyRef::new("CCD Simulator", "CCD_EXPOSURE")
            }]
        );

        // deleting again is a no-op
        let changes = apply(
            &mut tree,
            IndiEvent::Delete(DeleteProperty::property("CCD Simulator", "CCD_EXPOSURE")),
        );
        assert!(changes.is_empty());
        assert_eq!(tree.property_count(), 1);

        let changes = apply(
            &mut tree,
            IndiEvent::Delete(DeleteProperty::device("CCD Simulator")),
        );
        assert_eq!(
            changes,
            vec![TreeChange::DeviceRemoved {
                device: "CCD Simulator".to_string()
            }]
        );
        assert!(tree.is_empty());
    }

    #[test]
    fn test_snapshot_wins_over_earlier_push_update() {
        let mut tree = PropertyTree::new();
        apply(&mut tree, IndiEvent::Define(exposure_define()));
        apply(
            &mut tree,
            IndiEvent::Update(
                UpdateProperty::new("CCD Simulator", "CCD_EXPOSURE").state(PropertyState::Busy),
            ),
        );

        let mut snapshot_tree = PropertyTree::new();
        apply(
            &mut snapshot_tree,
            IndiEvent::Define(exposure_define().state(PropertyState::Ok)),
        );
        let changes = apply(
            &mut tree,
            IndiEvent::Snapshot(snapshot_tree.devices().clone()),
        );

        let prop = PropertyRef::new("CCD Simulator", "CCD_EXPOSURE");
        assert_eq!(tree.get_property(&prop).unwrap().state, PropertyState::Ok);
        assert_eq!(
            changes,
            vec![
                TreeChange::DeviceRetained {
                    device: "CCD Simulator".to_string()
                },
                TreeChange::PropertyDefined {
                    prop,
                    replaced: true
                },
            ]
        );
        assert!(tree.last_snapshot().is_some());
    }

    #[test]
    fn test_snapshot_adds_prunes_and_retains_devices() {
        let mut tree = PropertyTree::new();
        apply(&mut tree, IndiEvent::Define(exposure_define()));
        apply(&mut tree, IndiEvent::Define(temperature_define()));
        apply(
            &mut tree,
            IndiEvent::Define(
                DefineProperty::new("Telescope Simulator", "CONNECTION")
                    .kind(VectorKind::Switch)
                    .element("CONNECT", "Connect", "On"),
            ),
        );

        let yaml = r#"
CCD Simulator:
  CCD_EXPOSURE:
    label: Expose
    group: Main Control
    state: Idle
    kind: number
    elements:
      CCD_EXPOSURE_VALUE:
        label: Duration (s)
        text: "1"
Focuser Simulator:
  ABS_FOCUS_POSITION:
    label: Absolute Position
    state: Ok
    kind: number
    elements:
      FOCUS_ABSOLUTE_POSITION:
        label: Steps
        text: "50000"
"#;
        let devices: DeviceMap = serde_yml::from_str(yaml).unwrap();
        let changes = apply(&mut tree, IndiEvent::Snapshot(devices));

        assert_eq!(
            changes,
            vec![
                TreeChange::DeviceRetained {
                    device: "CCD Simulator".to_string()
                },
                TreeChange::PropertyRemoved {
                    prop: PropertyRef::new("CCD Simulator", "CCD_TEMPERATURE")
                },
                TreeChange::DeviceAdded {
                    device: "Focuser Simulator".to_string()
                },
                TreeChange::PropertyDefined {
                    prop: PropertyRef::new("Focuser Simulator", "ABS_FOCUS_POSITION"),
                    replaced: false
                },
                TreeChange::DeviceRemoved {
                    device: "Telescope Simulator".to_string()
                },
            ]
        );
        assert_eq!(tree.count(), 2);
        assert_eq!(
            tree.element_text(
                &PropertyRef::new("Focuser Simulator", "ABS_FOCUS_POSITION"),
                "FOCUS_ABSOLUTE_POSITION"
            ),
            Some("50000")
        );
    }

    #[test]
    fn test_snapshot_labels_fall_back_to_names() {
        let yaml = r#"
CCD Simulator:
  CCD_EXPOSURE:
    state: Busy
    kind: number
    elements:
      CCD_EXPOSURE_VALUE:
        text: "3"
"#;
        let devices: DeviceMap = serde_yml::from_str(yaml).unwrap();
        let mut from_snapshot = PropertyTree::new();
        apply(&mut from_snapshot, IndiEvent::Snapshot(devices));

        let mut from_define = PropertyTree::new();
        apply(
            &mut from_define,
            IndiEvent::Define(
                DefineProperty::new("CCD Simulator", "CCD_EXPOSURE")
                    .state(PropertyState::Busy)
                    .kind(VectorKind::Number)
                    .element("CCD_EXPOSURE_VALUE", "", "3"),
            ),
        );

        assert_eq!(from_snapshot.devices(), from_define.devices());
        let prop = from_snapshot
            .get_property(&PropertyRef::new("CCD Simulator", "CCD_EXPOSURE"))
            .unwrap();
        assert_eq!(prop.label, "CCD_EXPOSURE");
        assert_eq!(
            prop.elements.get("CCD_EXPOSURE_VALUE").unwrap().label,
            "CCD_EXPOSURE_VALUE"
        );
    }

    #[test]
    fn test_snapshot_time_is_serialized() {
        let mut tree = PropertyTree::new();
        let yaml = serde_yml::to_string(&tree).unwrap();
        assert!(!yaml.contains("last_snapshot"));

        apply(&mut tree, IndiEvent::Snapshot(DeviceMap::new()));
        let yaml = serde_yml::to_string(&tree).unwrap();
        assert!(yaml.contains("last_snapshot:"));
    }

    #[test]
    fn test_poll_snapshot_payload_shape() {
        let yaml = r#"
isConnected: true
lastSavedImagePath: /home/astro/images/light_001.fits
devices:
  CCD Simulator:
    CCD_EXPOSURE:
      label: Expose
      state: Busy
      elements:
        CCD_EXPOSURE_VALUE:
          label: Duration (s)
          text: "12.34"
"#;
        let snapshot: PollSnapshot = serde_yml::from_str(yaml).unwrap();
        assert!(snapshot.is_connected);
        assert_eq!(
            snapshot.last_saved_image_path.as_deref(),
            Some("/home/astro/images/light_001.fits")
        );
        let prop = snapshot.devices["CCD Simulator"]
            .property("CCD_EXPOSURE")
            .unwrap();
        assert_eq!(prop.state, PropertyState::Busy);
        // kind is optional on the wire
        assert_eq!(prop.kind, VectorKind::Text);
        assert_eq!(prop.elements.text("CCD_EXPOSURE_VALUE"), Some("12.34"));
    }

    #[test]
    fn test_property_state_parsing() {
        assert_eq!("Busy".parse::<PropertyState>(), Ok(PropertyState::Busy));
        assert_eq!(PropertyState::Alert.to_string(), "Alert");
        assert!("busy".parse::<PropertyState>().is_err());
    }
}
