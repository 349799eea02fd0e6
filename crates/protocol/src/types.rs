//! Notify protocol types
//!
//! Closed vocabularies exchanged between the policy engines, the attribute
//! surface and the controller driver.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Resolved role decision handed to the controller's `set_disable` hook
///
/// `All` permits both host and client roles, `None` permits neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RoleState {
    Host,
    Client,
    All,
    None,
}

impl RoleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Host => "HOST",
            Self::Client => "CLIENT",
            Self::All => "ALL",
            Self::None => "NONE",
        }
    }
}

impl fmt::Display for RoleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// MDM class policy switch handed to the controller's `set_mdm` hook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MdmState {
    On,
    Off,
}

impl fmt::Display for MdmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => f.write_str("ON"),
            Self::Off => f.write_str("OFF"),
        }
    }
}

/// Security lock level written through `usb_sl`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockLevel {
    #[default]
    Init,
    Unlocked,
    WorkLocked,
    Restricted,
}

impl LockLevel {
    /// Decode the integer form used on the attribute surface
    pub fn from_raw(raw: u64) -> Option<Self> {
        match raw {
            0 => Some(Self::Init),
            1 => Some(Self::Unlocked),
            2 => Some(Self::WorkLocked),
            3 => Some(Self::Restricted),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> u64 {
        match self {
            Self::Init => 0,
            Self::Unlocked => 1,
            Self::WorkLocked => 2,
            Self::Restricted => 3,
        }
    }

    /// Name used in log lines
    pub fn name(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Unlocked => "unlock",
            Self::WorkLocked => "usb work lock",
            Self::Restricted => "usb restrict lock",
        }
    }
}

impl fmt::Display for LockLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// USB bus speed, indexed like the kernel's `enum usb_device_speed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsbSpeed {
    #[default]
    Unknown,
    Low,
    Full,
    High,
    Wireless,
    Super,
    SuperPlus,
}

impl UsbSpeed {
    pub const ALL: [UsbSpeed; 7] = [
        Self::Unknown,
        Self::Low,
        Self::Full,
        Self::High,
        Self::Wireless,
        Self::Super,
        Self::SuperPlus,
    ];

    pub fn index(&self) -> u8 {
        *self as u8
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Name used by `usb_maximum_speed`
    pub fn max_speed_name(&self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Low => "low-speed",
            Self::Full => "full-speed",
            Self::High => "high-speed",
            Self::Wireless => "wireless-usb",
            Self::Super => "super-speed",
            Self::SuperPlus => "super-speed+",
        }
    }

    /// Name used by `otg_speed`
    pub fn otg_name(&self) -> &'static str {
        match self {
            Self::SuperPlus => "SUPER PLUS",
            Self::Super => "SUPER",
            Self::High => "HIGH",
            Self::Full => "FULL",
            Self::Low => "LOW",
            Self::Unknown | Self::Wireless => "UNKNOWN",
        }
    }

    /// Kernel `usb_speed_string` form used by `gadget_speed`
    pub fn kernel_name(&self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Low => "low-speed",
            Self::Full => "full-speed",
            Self::High => "high-speed",
            Self::Wireless => "wireless",
            Self::Super => "super-speed",
            Self::SuperPlus => "super-speed-plus",
        }
    }

    /// Match a `usb_maximum_speed` token by name prefix
    ///
    /// The token must start with one of the max-speed names; the longest
    /// matching name wins so `super-speed+` is not shadowed by `super-speed`.
    /// `UNKNOWN` is never a valid request.
    pub fn parse_max_speed(token: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .filter(|speed| token.starts_with(speed.max_speed_name()))
            .max_by_key(|speed| speed.max_speed_name().len())
            .copied()
            .filter(|speed| *speed != Self::Unknown)
    }
}

/// Query or update issued to the controller's max-speed hook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedRequest {
    /// Report the current maximum speed
    Query,
    /// Limit the port to this speed
    Set(UsbSpeed),
}

/// Attribute exposed per notify device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Disable,
    UsbDataEnabled,
    Support,
    OtgSpeed,
    GadgetSpeed,
    UsbMaximumSpeed,
    WhitelistForMdm,
    Cards,
    UsbHwParam,
    HwParam,
    UsbRequestAction,
    UsbSl,
}

impl Attribute {
    pub const ALL: [Attribute; 12] = [
        Self::Disable,
        Self::UsbDataEnabled,
        Self::Support,
        Self::OtgSpeed,
        Self::GadgetSpeed,
        Self::UsbMaximumSpeed,
        Self::WhitelistForMdm,
        Self::Cards,
        Self::UsbHwParam,
        Self::HwParam,
        Self::UsbRequestAction,
        Self::UsbSl,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Disable => "disable",
            Self::UsbDataEnabled => "usb_data_enabled",
            Self::Support => "support",
            Self::OtgSpeed => "otg_speed",
            Self::GadgetSpeed => "gadget_speed",
            Self::UsbMaximumSpeed => "usb_maximum_speed",
            Self::WhitelistForMdm => "whitelist_for_mdm",
            Self::Cards => "cards",
            Self::UsbHwParam => "usb_hw_param",
            Self::HwParam => "hw_param",
            Self::UsbRequestAction => "usb_request_action",
            Self::UsbSl => "usb_sl",
        }
    }

    pub fn is_writable(&self) -> bool {
        !matches!(
            self,
            Self::Support | Self::OtgSpeed | Self::GadgetSpeed | Self::Cards
        )
    }

    /// Whether the attribute belongs to the hw-param group
    pub fn is_hw_param(&self) -> bool {
        matches!(self, Self::UsbHwParam | Self::HwParam)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Attribute {
    type Err = crate::NotifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|attr| attr.name() == s)
            .copied()
            .ok_or_else(|| crate::NotifyError::Unsupported(s.to_string()))
    }
}
