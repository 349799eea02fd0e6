//! Shared test helpers: a controller that records every hook call

#![allow(dead_code)]

use protocol::{HwParam, LockLevel, MdmState, RoleState, SpeedRequest, UsbSpeed};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use usb_notify::{NotifyConfig, NotifyController, NotifyDevice};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Disable(RoleState),
    Mdm(MdmState),
    Lock(LockLevel),
    Speed(SpeedRequest),
    Uevent(Vec<String>),
}

#[derive(Debug, Default)]
pub struct RecordingController {
    pub calls: Mutex<Vec<Call>>,
    pub max_speed: Mutex<UsbSpeed>,
    pub skip: HashSet<HwParam>,
    /// Returned by every hw_param_manager pull
    pub pulled: u64,
    pub version: Option<u64>,
    pub host_unsupported: bool,
}

impl RecordingController {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn disables(&self) -> Vec<RoleState> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Disable(state) => Some(state),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl NotifyController for RecordingController {
    fn set_disable(&self, state: RoleState) {
        self.record(Call::Disable(state));
    }

    fn set_mdm(&self, state: MdmState) {
        self.record(Call::Mdm(state));
    }

    fn set_lock_state(&self, level: LockLevel) {
        self.record(Call::Lock(level));
    }

    fn control_usb_max_speed(&self, request: SpeedRequest) -> UsbSpeed {
        self.record(Call::Speed(request));
        let mut max_speed = self.max_speed.lock().unwrap();
        if let SpeedRequest::Set(speed) = request {
            *max_speed = speed;
        }
        *max_speed
    }

    fn hw_param_manager(&self, _counter: HwParam) -> u64 {
        self.pulled
    }

    fn is_skip_list(&self, counter: HwParam) -> bool {
        self.skip.contains(&counter)
    }

    fn ccic_version(&self) -> Option<u64> {
        self.version
    }

    fn host_supported(&self) -> bool {
        !self.host_unsupported
    }

    fn connected_device_max_speed(&self) -> UsbSpeed {
        UsbSpeed::High
    }

    fn send_uevent(&self, env: &[String]) {
        self.record(Call::Uevent(env.to_vec()));
    }
}

pub fn make_device_with(
    controller: RecordingController,
    config: &NotifyConfig,
) -> (NotifyDevice, Arc<RecordingController>) {
    let controller = Arc::new(controller);
    let device = NotifyDevice::new("usb_control", 1, controller.clone(), config);
    (device, controller)
}

pub fn make_device() -> (NotifyDevice, Arc<RecordingController>) {
    make_device_with(RecordingController::default(), &NotifyConfig::default())
}
