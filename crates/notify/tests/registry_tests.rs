//! Integration tests for the notify device registry

mod common;

use common::{Call, RecordingController};
use protocol::{Attribute, NotifyError, RoleState};
use std::sync::Arc;
use usb_notify::{NotifyConfig, NotifyRegistry};

#[test]
fn test_devices_are_independent() {
    let registry = NotifyRegistry::new(NotifyConfig::default());
    let first = Arc::new(RecordingController::default());
    let second = Arc::new(RecordingController::default());
    registry.register("usb_control", first.clone()).unwrap();
    registry.register("usb_control_2", second.clone()).unwrap();

    registry
        .store("usb_control", Attribute::Disable, "ON_HOST_MDM")
        .unwrap();
    assert_eq!(registry.show("usb_control", Attribute::Disable).unwrap(), "ON_HOST_MDM\n");
    assert_eq!(registry.show("usb_control_2", Attribute::Disable).unwrap(), "OFF\n");
    assert_eq!(first.calls(), vec![Call::Disable(RoleState::Host)]);
    assert!(second.calls().is_empty());
}

#[test]
fn test_index_is_not_reused() {
    let registry = NotifyRegistry::new(NotifyConfig::default());
    registry
        .register("usb_control", Arc::new(RecordingController::default()))
        .unwrap();
    registry.unregister("usb_control").unwrap();
    let again = registry
        .register("usb_control", Arc::new(RecordingController::default()))
        .unwrap();
    assert_eq!(again.index(), 2);
    assert_eq!(again.role_command(), "OFF");
}

#[test]
fn test_unregister_twice() {
    let registry = NotifyRegistry::new(NotifyConfig::default());
    registry
        .register("usb_control", Arc::new(RecordingController::default()))
        .unwrap();
    registry.unregister("usb_control").unwrap();
    assert!(matches!(
        registry.unregister("usb_control"),
        Err(NotifyError::NullDevice(_))
    ));
}

#[test]
fn test_unregister_during_operations() {
    let registry = NotifyRegistry::new(NotifyConfig::default());
    let controller = Arc::new(RecordingController::default());
    registry.register("usb_control", controller.clone()).unwrap();

    std::thread::scope(|s| {
        let registry = &registry;
        let reader = s.spawn(move || {
            let mut served = 0;
            for _ in 0..200 {
                match registry.show("usb_control", Attribute::Disable) {
                    Ok(text) => {
                        assert!(text.ends_with('\n'));
                        served += 1;
                    }
                    Err(e) => assert!(matches!(e, NotifyError::NullDevice(_))),
                }
            }
            served
        });
        registry.unregister("usb_control").unwrap();
        let served = reader.join().unwrap();
        assert!(served <= 200);
    });

    assert!(registry.device("usb_control").is_err());
    // Only the test's own handle is left once the device is gone
    assert_eq!(Arc::strong_count(&controller), 1);
}

#[test]
fn test_register_configured_honors_host_support() {
    let config = NotifyConfig::from_toml(
        r#"
[[devices]]
name = "usb_control"

[[devices]]
name = "usb_control_2"
host_supported = false
"#,
    )
    .unwrap();
    let registry = NotifyRegistry::new(config);
    let devices = registry.register_configured().unwrap();

    assert_eq!(devices.len(), 2);
    assert_eq!(registry.names(), vec!["usb_control", "usb_control_2"]);
    assert_eq!(registry.show("usb_control", Attribute::Support).unwrap(), "ALL\n");
    assert_eq!(
        registry.show("usb_control_2", Attribute::Support).unwrap(),
        "CLIENT\n"
    );
}

#[test]
fn test_register_configured_default_device() {
    let registry = NotifyRegistry::new(NotifyConfig::default());
    registry.register_configured().unwrap();
    assert_eq!(registry.names(), vec!["usb_control"]);
    assert!(matches!(
        registry.register_configured(),
        Err(NotifyError::DuplicateDevice(_))
    ));
}
