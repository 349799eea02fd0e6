//! USB interface class table
//!
//! Maps each policy class slot to its three letter mnemonic and to the
//! `bInterfaceClass` code reported by devices.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Interface class slot used by the MDM class policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum UsbClass {
    PerInterface = 0,
    Audio,
    Comm,
    Hid,
    Physical,
    StillImage,
    Printer,
    MassStorage,
    Hub,
    CdcData,
    SmartCard,
    ContentSecurity,
    Video,
    WirelessController,
    Misc,
    AppSpecific,
    VendorSpecific,
}

/// Number of class slots
pub const CLASS_COUNT: usize = 17;

impl UsbClass {
    pub const ALL: [UsbClass; CLASS_COUNT] = [
        Self::PerInterface,
        Self::Audio,
        Self::Comm,
        Self::Hid,
        Self::Physical,
        Self::StillImage,
        Self::Printer,
        Self::MassStorage,
        Self::Hub,
        Self::CdcData,
        Self::SmartCard,
        Self::ContentSecurity,
        Self::Video,
        Self::WirelessController,
        Self::Misc,
        Self::AppSpecific,
        Self::VendorSpecific,
    ];

    /// Slot index, `0..CLASS_COUNT`
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Self::PerInterface => "PER",
            Self::Audio => "AUD",
            Self::Comm => "COM",
            Self::Hid => "HID",
            Self::Physical => "PHY",
            Self::StillImage => "STI",
            Self::Printer => "PRI",
            Self::MassStorage => "MAS",
            Self::Hub => "HUB",
            Self::CdcData => "CDC",
            Self::SmartCard => "CSC",
            Self::ContentSecurity => "CON",
            Self::Video => "VID",
            Self::WirelessController => "WIR",
            Self::Misc => "MIS",
            Self::AppSpecific => "APP",
            Self::VendorSpecific => "VEN",
        }
    }

    /// Match a whitelist token by its first three characters
    pub fn from_mnemonic(token: &str) -> Option<Self> {
        let prefix = token.get(..3)?;
        Self::ALL.iter().find(|c| c.mnemonic() == prefix).copied()
    }

    /// `bInterfaceClass` code as assigned by USB-IF
    pub fn usb_class_code(&self) -> u8 {
        match self {
            Self::PerInterface => 0x00,
            Self::Audio => 0x01,
            Self::Comm => 0x02,
            Self::Hid => 0x03,
            Self::Physical => 0x05,
            Self::StillImage => 0x06,
            Self::Printer => 0x07,
            Self::MassStorage => 0x08,
            Self::Hub => 0x09,
            Self::CdcData => 0x0A,
            Self::SmartCard => 0x0B,
            Self::ContentSecurity => 0x0D,
            Self::Video => 0x0E,
            Self::WirelessController => 0xE0,
            Self::Misc => 0xEF,
            Self::AppSpecific => 0xFE,
            Self::VendorSpecific => 0xFF,
        }
    }

    /// Slot for a `bInterfaceClass` code; codes outside the table have none
    pub fn from_usb_class_code(code: u8) -> Option<Self> {
        Self::ALL.iter().find(|c| c.usb_class_code() == code).copied()
    }
}

impl fmt::Display for UsbClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
