//! Notify device record and its attribute surface
//!
//! One [`NotifyDevice`] exists per registered USB notify endpoint. It owns
//! the role command state, the secure lock state, both allowlists, the
//! hardware counters and the audio card table, and routes every attribute
//! read and write to them.
//!
//! Locking:
//! - role command, lock level and data-enabled flag share one mutex, so
//!   writers are serialized and always see a complete previous command
//! - the class policy sits behind a reader/writer lock, and `set_mdm` runs
//!   while its write lock is held
//! - the VID:PID allowlist has its own exclusive lock (see [`IdAllowPolicy`])
//! - the counter table has its own lock (see [`HwParamStore`])

use crate::audio::{AudioCard, AudioCards};
use crate::capability::NotifyController;
use crate::class_policy::{ClassAllowPolicy, ClassPolicyUpdate};
use crate::config::{Features, Limits, NotifyConfig};
use crate::hw_param::HwParamStore;
use crate::id_policy::{DeviceIdPair, IdAllowPolicy};
use crate::role::RoleCommandResolver;
use crate::secure_lock::{LockTransition, SecureLockController};
use protocol::{
    Attribute, HW_PARAM_COUNT, HwParam, LockLevel, NotifyError, PULLED_HW_PARAMS, Result,
    RoleState, SpeedRequest, UsbClass, UsbSpeed,
};
use serde::Serialize;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tracing::{debug, info, warn};

/// Routing prefix of VID:PID allowlist writes
pub const ALLOWLIST_PREFIX: &str = "VPID:";

/// Shortest accepted whitelist write
const MIN_WHITELIST_LEN: usize = 3;

#[derive(Debug, Default)]
struct ControlState {
    role: RoleCommandResolver,
    lock: SecureLockController,
    usb_data_enabled: bool,
}

/// Which table a whitelist write updated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhitelistUpdate {
    Classes(ClassPolicyUpdate),
    /// Number of VID:PID pairs now allowed
    Ids(usize),
}

/// Serializable view of a device's policy state
#[derive(Debug, Clone, Serialize)]
pub struct DeviceStatus {
    pub name: String,
    pub index: u32,
    pub command: String,
    pub role: RoleState,
    pub usb_data_enabled: bool,
    pub lock_level: LockLevel,
    pub first_restrict: bool,
    pub whitelist: String,
    pub allowed_classes: Vec<UsbClass>,
    pub allowed_ids: Vec<DeviceIdPair>,
    pub request_action: u32,
}

/// Policy record of one USB notify endpoint
pub struct NotifyDevice {
    name: String,
    index: u32,
    controller: Arc<dyn NotifyController>,
    limits: Limits,
    features: Features,
    control: Mutex<ControlState>,
    class_policy: RwLock<ClassAllowPolicy>,
    id_policy: IdAllowPolicy,
    hw_params: HwParamStore,
    request_action: AtomicU32,
    audio_cards: RwLock<AudioCards>,
}

impl std::fmt::Debug for NotifyDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyDevice")
            .field("name", &self.name)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

impl NotifyDevice {
    /// Build a device in its registration state: command `OFF`, data
    /// enabled, lock level `Init`, empty allowlists, zeroed counters
    pub fn new(
        name: impl Into<String>,
        index: u32,
        controller: Arc<dyn NotifyController>,
        config: &NotifyConfig,
    ) -> Self {
        let limits = config.limits.clone();
        let features = config.features.clone();
        let hw_params = if features.hw_param {
            HwParamStore::new(limits.hwparam_data_limit)
        } else {
            HwParamStore::unallocated(limits.hwparam_data_limit)
        };

        Self {
            name: name.into(),
            index,
            controller,
            control: Mutex::new(ControlState {
                usb_data_enabled: true,
                ..ControlState::default()
            }),
            class_policy: RwLock::new(ClassAllowPolicy::default()),
            id_policy: IdAllowPolicy::new(limits.max_allowlist_entries),
            hw_params,
            request_action: AtomicU32::new(0),
            audio_cards: RwLock::new(AudioCards::new(limits.max_audio_cards, limits.max_card_len)),
            limits,
            features,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    fn control(&self) -> MutexGuard<'_, ControlState> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current role command text
    pub fn role_command(&self) -> String {
        self.control().role.command().to_string()
    }

    pub fn role_state(&self) -> RoleState {
        self.control().role.state()
    }

    /// Resolve a role command and apply it through the controller
    pub fn submit_role_command(&self, command: &str) -> Result<RoleState> {
        let mut control = self.control();
        let state = control.role.submit(command)?;
        self.controller.set_disable(state);
        Ok(state)
    }

    pub fn usb_data_enabled(&self) -> bool {
        self.control().usb_data_enabled
    }

    /// Turn USB data on or off without going through the command table
    pub fn set_usb_data_enabled(&self, enabled: bool) {
        let mut control = self.control();
        control.usb_data_enabled = enabled;
        let state = if enabled {
            RoleState::All
        } else {
            RoleState::None
        };
        info!("usb_data_enabled={}", u8::from(enabled));
        self.controller.set_disable(state);
    }

    pub fn secure_lock(&self) -> LockLevel {
        self.control().lock.level()
    }

    pub fn first_restrict(&self) -> bool {
        self.control().lock.first_restrict()
    }

    /// Record a lock level, notify the controller, then apply the
    /// first-restriction side effects
    pub fn set_secure_lock(&self, level: LockLevel) -> LockTransition {
        let mut control = self.control();
        let previous = control.lock.set_level(level);
        self.controller.set_lock_state(level);

        if !self.features.lockscreen_restriction {
            info!("secure_lock after = {}", level);
            return LockTransition {
                previous,
                current: level,
                forced: None,
            };
        }

        let transition = control.lock.settle(previous);
        if let Some(forced) = transition.forced {
            info!(
                "lock {} -> {} forces role {}",
                previous, level, forced
            );
            self.controller.set_disable(forced);
            control.role.force(forced);
        }
        transition
    }

    pub fn max_speed(&self) -> UsbSpeed {
        self.controller.control_usb_max_speed(SpeedRequest::Query)
    }

    pub fn set_max_speed(&self, speed: UsbSpeed) -> UsbSpeed {
        let now = self.controller.control_usb_max_speed(SpeedRequest::Set(speed));
        info!(
            "usb_maximum_speed req={} now={}",
            speed.max_speed_name(),
            now.max_speed_name()
        );
        now
    }

    /// Apply whitelist text, routing `VPID:` text to the id allowlist
    pub fn update_whitelist(&self, text: &str) -> WhitelistUpdate {
        if self.features.lockscreen_restriction {
            if let Some(pairs) = text.strip_prefix(ALLOWLIST_PREFIX) {
                info!("allowlist_for_mdm VID, PID buf={}", text);
                let count = self.id_policy.replace(text, pairs);
                info!("vpid allowlist update done, {} entries", count);
                return WhitelistUpdate::Ids(count);
            }
        }

        info!("whitelist_for_mdm buf={}", text);
        // The MDM switch must follow table updates in the same order
        let mut policy = self
            .class_policy
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let update = policy.replace(text);
        self.controller.set_mdm(update.mdm);
        WhitelistUpdate::Classes(update)
    }

    pub fn is_class_allowed(&self, class: UsbClass) -> bool {
        self.class_policy
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(class)
    }

    /// Membership by `bInterfaceClass` code
    pub fn is_interface_class_allowed(&self, code: u8) -> bool {
        self.class_policy
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .allows_class_code(code)
    }

    pub fn is_device_allowed(&self, vendor_id: u16, product_id: u16) -> bool {
        self.id_policy.contains(vendor_id, product_id)
    }

    pub fn whitelist_text(&self) -> String {
        self.class_policy
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .text()
            .to_string()
    }

    pub fn allowlist_text(&self) -> String {
        self.id_policy.text()
    }

    pub fn hw_params(&self) -> &HwParamStore {
        &self.hw_params
    }

    /// Add to a counter by name unless the controller hides it
    pub fn accumulate_hw_param(&self, name: &str, delta: u64) -> bool {
        match HwParam::from_name(name) {
            Some(counter) if !self.controller.is_skip_list(counter) => {
                self.hw_params.accumulate(counter, delta);
                true
            }
            Some(counter) => {
                debug!("hw param {} is on the skip list", counter);
                false
            }
            None => false,
        }
    }

    fn pull_hw_params(&self) {
        for counter in PULLED_HW_PARAMS {
            self.hw_params
                .accumulate(counter, self.controller.hw_param_manager(counter));
        }
    }

    fn refresh_version(&self) {
        if let Some(version) = self.controller.ccic_version() {
            self.hw_params.set(HwParam::VERSION, version);
        }
    }

    pub fn request_action(&self) -> u32 {
        self.request_action.load(Ordering::Acquire)
    }

    pub fn set_audio_card(&self, index: usize, card: AudioCard) -> bool {
        self.audio_cards
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set(index, card)
    }

    /// Validate and forward a uevent environment
    ///
    /// The first entry must start with `TYPE` and the second with `STATE`.
    pub fn uevent(&self, env: &[String]) -> Result<()> {
        match env {
            [kind, state, ..] if kind.starts_with("TYPE") && state.starts_with("STATE") => {
                self.controller.send_uevent(env);
                Ok(())
            }
            _ => Err(NotifyError::InvalidUevent(env.join(" "))),
        }
    }

    pub fn status(&self) -> DeviceStatus {
        let (command, role, usb_data_enabled, lock) = {
            let control = self.control();
            (
                control.role.command().to_string(),
                control.role.state(),
                control.usb_data_enabled,
                control.lock,
            )
        };
        let (whitelist, allowed_classes): (String, Vec<UsbClass>) = {
            let policy = self
                .class_policy
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            (policy.text().to_string(), policy.set().classes().collect())
        };

        DeviceStatus {
            name: self.name.clone(),
            index: self.index,
            command,
            role,
            usb_data_enabled,
            lock_level: lock.level(),
            first_restrict: lock.first_restrict(),
            whitelist,
            allowed_classes,
            allowed_ids: self.id_policy.list().entries().to_vec(),
            request_action: self.request_action(),
        }
    }

    fn attribute_exposed(&self, attr: Attribute) -> Result<()> {
        if attr.is_hw_param() && !self.features.hw_param {
            return Err(NotifyError::Unsupported(attr.name().to_string()));
        }
        Ok(())
    }

    /// Read an attribute; the text is newline terminated
    pub fn show(&self, attr: Attribute) -> Result<String> {
        self.attribute_exposed(attr)?;

        let text = match attr {
            Attribute::Disable => self.role_command(),
            Attribute::UsbDataEnabled => u8::from(self.usb_data_enabled()).to_string(),
            Attribute::Support => {
                if self.controller.host_supported() && self.features.host_notify {
                    "ALL".to_string()
                } else {
                    "CLIENT".to_string()
                }
            }
            Attribute::OtgSpeed => self
                .controller
                .connected_device_max_speed()
                .otg_name()
                .to_string(),
            Attribute::GadgetSpeed => self
                .controller
                .gadget_speed()
                .map(|speed| speed.kernel_name())
                .unwrap_or("UNKNOWN")
                .to_string(),
            Attribute::UsbMaximumSpeed => self.max_speed().max_speed_name().to_string(),
            Attribute::WhitelistForMdm => self.whitelist_text(),
            Attribute::Cards => self
                .audio_cards
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .render(),
            Attribute::UsbHwParam => {
                self.pull_hw_params();
                self.refresh_version();
                let text = self.hw_params.render_numeric();
                debug!("usb_hw_param rendered {} bytes", text.len());
                return Ok(text);
            }
            Attribute::HwParam => {
                self.pull_hw_params();
                if !self.controller.is_skip_list(HwParam::VERSION) {
                    self.refresh_version();
                }
                let text = self
                    .hw_params
                    .render_named(|counter| self.controller.is_skip_list(counter));
                debug!("hw_param rendered {} bytes", text.len());
                return Ok(text);
            }
            Attribute::UsbRequestAction => self.request_action().to_string(),
            Attribute::UsbSl => self.secure_lock().as_raw().to_string(),
        };

        debug!("read {} {}", attr, text);
        Ok(format!("{}\n", text))
    }

    /// Write an attribute, returning the number of bytes consumed
    pub fn store(&self, attr: Attribute, buf: &str) -> Result<usize> {
        self.attribute_exposed(attr)?;
        let size = buf.len();

        match attr {
            Attribute::Disable => {
                check_len(size, self.limits.max_disable_len, attr)?;
                self.submit_role_command(first_token(buf)?)?;
            }
            Attribute::UsbDataEnabled => {
                check_len(size, self.limits.page_size, attr)?;
                match first_token(buf)? {
                    "0" => self.set_usb_data_enabled(false),
                    "1" => self.set_usb_data_enabled(true),
                    other => {
                        warn!("usb_data_enabled({}) error", other);
                        return Err(NotifyError::InvalidCommand(other.to_string()));
                    }
                }
            }
            Attribute::UsbMaximumSpeed => {
                check_len(size, self.limits.max_speed_len, attr)?;
                let token = first_token(buf)?;
                let speed = UsbSpeed::parse_max_speed(token)
                    .ok_or_else(|| NotifyError::InvalidCommand(token.to_string()))?;
                self.set_max_speed(speed);
            }
            Attribute::WhitelistForMdm => {
                let limit = if self.features.lockscreen_restriction
                    && buf.starts_with(ALLOWLIST_PREFIX)
                {
                    self.limits.max_allowlist_len
                } else {
                    self.limits.max_whitelist_len
                };
                check_len(size, limit, attr)?;
                if size < MIN_WHITELIST_LEN {
                    return Err(NotifyError::ParseFailure(format!(
                        "{} needs at least {} bytes",
                        attr, MIN_WHITELIST_LEN
                    )));
                }
                self.update_whitelist(first_token(buf)?);
            }
            Attribute::UsbHwParam => {
                check_len(size, self.limits.max_hwparam_len, attr)?;
                if size < HW_PARAM_COUNT {
                    warn!("usb_hw_param input of {} bytes is not a counter dump", size);
                    return Err(NotifyError::ParseFailure(
                        "counter dump too short".to_string(),
                    ));
                }
                self.hw_params.bulk_add_text(buf)?;
            }
            Attribute::HwParam => {
                check_len(size, 2, attr)?;
                if buf.starts_with('c') {
                    info!("hw_param reset");
                    self.hw_params.reset_all();
                }
            }
            Attribute::UsbRequestAction => {
                check_len(size, self.limits.page_size, attr)?;
                let token = first_token(buf)?;
                let action: u32 = token
                    .parse()
                    .map_err(|_| NotifyError::ParseFailure(token.to_string()))?;
                self.request_action.store(action, Ordering::Release);
                info!("request_action = {}", action);
            }
            Attribute::UsbSl => {
                check_len(size, self.limits.page_size, attr)?;
                let token = first_token(buf)?;
                let raw: u64 = token
                    .parse()
                    .map_err(|_| NotifyError::ParseFailure(token.to_string()))?;
                let level = LockLevel::from_raw(raw)
                    .ok_or_else(|| NotifyError::InvalidCommand(token.to_string()))?;
                self.set_secure_lock(level);
            }
            Attribute::Support | Attribute::OtgSpeed | Attribute::GadgetSpeed | Attribute::Cards => {
                return Err(NotifyError::Unsupported(format!("{} is read-only", attr)));
            }
        }

        Ok(size)
    }
}

fn check_len(len: usize, max: usize, attr: Attribute) -> Result<()> {
    if len > max {
        warn!("{} size({}) is too long", attr, len);
        return Err(NotifyError::InputTooLong { len, max });
    }
    Ok(())
}

/// First whitespace delimited word of an attribute write
fn first_token(buf: &str) -> Result<&str> {
    buf.split_whitespace()
        .next()
        .ok_or_else(|| NotifyError::ParseFailure("empty input".to_string()))
}
