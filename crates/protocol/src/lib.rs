//! Protocol vocabulary for usb-notify
//!
//! This crate defines the closed sets of values that flow between the USB
//! notify policy engines, the attribute surface that feeds them text commands,
//! and the controller driver that acts on their decisions.
//!
//! # Example
//!
//! ```
//! use protocol::{UsbClass, UsbSpeed};
//!
//! assert_eq!(UsbClass::from_mnemonic("HUB"), Some(UsbClass::Hub));
//! assert_eq!(UsbSpeed::parse_max_speed("high-speed"), Some(UsbSpeed::High));
//! ```

pub mod class_table;
pub mod error;
pub mod hw_param;
pub mod types;

pub use class_table::{CLASS_COUNT, UsbClass};
pub use error::{NotifyError, Result, attribute_status};
pub use hw_param::{HW_PARAM_COUNT, HwParam, PULLED_HW_PARAMS};
pub use types::{Attribute, LockLevel, MdmState, RoleState, SpeedRequest, UsbSpeed};
