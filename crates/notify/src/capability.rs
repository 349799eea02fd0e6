//! Controller capabilities injected into each notify device
//!
//! The notify core decides policy; the controller driver acts on it. Each
//! device is built with one implementation of [`NotifyController`] and keeps
//! it for its whole lifetime.

use protocol::{HwParam, LockLevel, MdmState, RoleState, SpeedRequest, UsbSpeed};
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::info;

/// Hooks implemented by the PHY/controller driver
///
/// All hooks are synchronous and bounded; they are called while the device's
/// control state is held, so they must not call back into the same device.
pub trait NotifyController: Send + Sync {
    /// Apply a resolved role decision
    fn set_disable(&self, state: RoleState);

    /// Switch the MDM class filter on or off
    fn set_mdm(&self, state: MdmState);

    /// React to a new security lock level
    fn set_lock_state(&self, level: LockLevel);

    /// Query or limit the port's maximum speed, returning the speed now in effect
    fn control_usb_max_speed(&self, request: SpeedRequest) -> UsbSpeed;

    /// Events counted by the driver since the previous pull
    fn hw_param_manager(&self, _counter: HwParam) -> u64 {
        0
    }

    /// Counters hidden from the named counter dump
    fn is_skip_list(&self, _counter: HwParam) -> bool {
        false
    }

    /// Packed Type-C firmware version, if the controller knows it
    fn ccic_version(&self) -> Option<u64> {
        None
    }

    /// Whether the port can act as USB host at all
    fn host_supported(&self) -> bool {
        true
    }

    /// Highest speed among devices connected in host mode
    fn connected_device_max_speed(&self) -> UsbSpeed {
        UsbSpeed::Unknown
    }

    /// Current gadget speed, `None` when the gadget driver cannot say
    fn gadget_speed(&self) -> Option<UsbSpeed> {
        None
    }

    /// Deliver a validated uevent environment
    fn send_uevent(&self, _env: &[String]) {}
}

/// Controller that only records decisions in the log
///
/// Used by the command-line harness where no driver is attached; keeps a
/// simulated maximum speed so `usb_maximum_speed` reads back what was set.
#[derive(Debug)]
pub struct LoggingController {
    name: String,
    max_speed: AtomicU8,
    host_supported: bool,
}

impl LoggingController {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_speed: AtomicU8::new(UsbSpeed::SuperPlus.index()),
            host_supported: true,
        }
    }

    /// Simulate a port that can or cannot act as USB host
    pub fn with_host_support(mut self, supported: bool) -> Self {
        self.host_supported = supported;
        self
    }
}

impl NotifyController for LoggingController {
    fn set_disable(&self, state: RoleState) {
        info!("[{}] set_disable {}", self.name, state);
    }

    fn set_mdm(&self, state: MdmState) {
        info!("[{}] set_mdm {}", self.name, state);
    }

    fn set_lock_state(&self, level: LockLevel) {
        info!("[{}] set_lock_state {}", self.name, level);
    }

    fn control_usb_max_speed(&self, request: SpeedRequest) -> UsbSpeed {
        if let SpeedRequest::Set(speed) = request {
            self.max_speed.store(speed.index(), Ordering::Relaxed);
            info!("[{}] max speed limited to {}", self.name, speed.max_speed_name());
        }
        UsbSpeed::from_index(self.max_speed.load(Ordering::Relaxed)).unwrap_or_default()
    }

    fn host_supported(&self) -> bool {
        self.host_supported
    }

    fn send_uevent(&self, env: &[String]) {
        info!("[{}] uevent {}", self.name, env.join(" "));
    }
}
