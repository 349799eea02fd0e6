//! USB notify policy core
//!
//! Decides whether USB data, host and client roles are currently permitted,
//! and which interface classes and VID:PID identities may enumerate.
//!
//! - [`role`]: role command state machine behind the `disable` attribute
//! - [`secure_lock`]: lock level and the first-restriction latch
//! - [`class_policy`] / [`id_policy`]: MDM class and lockscreen VID:PID allowlists
//! - [`hw_param`]: hardware event counters
//! - [`device`]: per-endpoint record and attribute surface
//! - [`registry`]: owned table of registered devices
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use protocol::{Attribute, RoleState};
//! use usb_notify::{LoggingController, NotifyConfig, NotifyRegistry};
//!
//! let registry = NotifyRegistry::new(NotifyConfig::default());
//! let device = registry
//!     .register("usb_control", Arc::new(LoggingController::new("usb_control")))
//!     .unwrap();
//!
//! device.store(Attribute::Disable, "ON_HOST_MDM\n").unwrap();
//! assert_eq!(device.role_state(), RoleState::Host);
//! assert_eq!(device.show(Attribute::Disable).unwrap(), "ON_HOST_MDM\n");
//! ```

pub mod audio;
pub mod capability;
pub mod class_policy;
pub mod config;
pub mod device;
pub mod hw_param;
pub mod id_policy;
pub mod registry;
pub mod role;
pub mod secure_lock;

pub use audio::{AudioCard, AudioCards};
pub use capability::{LoggingController, NotifyController};
pub use class_policy::{ClassAllowPolicy, ClassAllowSet, ClassPolicyUpdate, parse_class_policy};
pub use config::NotifyConfig;
pub use device::{ALLOWLIST_PREFIX, DeviceStatus, NotifyDevice, WhitelistUpdate};
pub use hw_param::HwParamStore;
pub use id_policy::{DeviceIdPair, IdAllowList, IdAllowPolicy, parse_id_allowlist};
pub use registry::NotifyRegistry;
pub use role::{CommandBucket, RoleCommandResolver, Transition};
pub use secure_lock::{LockTransition, SecureLockController};
