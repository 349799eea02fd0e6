//! Hardware event counter names

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! hw_params {
    ($($variant:ident => $name:literal,)+) => {
        /// Hardware event counter, in fixed rendering order
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[repr(usize)]
        pub enum HwParam {
            $($variant,)+
        }

        impl HwParam {
            pub const ALL: &'static [HwParam] = &[$(Self::$variant,)+];

            /// Name printed by the named counter dump
            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }
        }
    };
}

hw_params! {
    CcWater => "CC_WATER",
    CcDry => "CC_DRY",
    CcI2c => "CC_I2C",
    CcOvc => "CC_OVC",
    CcOtg => "CC_OTG",
    CcDp => "CC_DP",
    CcVr => "CC_VR",
    HostSuper => "H_SUPER",
    HostHigh => "H_HIGH",
    HostFull => "H_FULL",
    HostLow => "H_LOW",
    ClientSuper => "C_SUPER",
    ClientHigh => "C_HIGH",
    HostAudio => "H_AUDIO",
    HostComm => "H_COMM",
    HostHid => "H_HID",
    HostPhysical => "H_PHYSIC",
    HostImage => "H_IMAGE",
    HostPrinter => "H_PRINTER",
    HostStorage => "H_STORAGE",
    HostStorageSuper => "H_STO_S",
    HostStorageHigh => "H_STO_H",
    HostStorageFull => "H_STO_F",
    HostHub => "H_HUB",
    HostCdc => "H_CDC",
    HostSmartCard => "H_CSCID",
    HostContent => "H_CONTENT",
    HostVideo => "H_VIDEO",
    HostWireless => "H_WIRE",
    HostMisc => "H_MISC",
    HostApp => "H_APP",
    HostVendor => "H_VENDOR",
    CcDex => "CC_DEX",
    CcWaterTime => "CC_WTIME",
    CcWaterVbus => "CC_WVBUS",
    CcWaterVbusTime => "CC_WVTIME",
    CcWaterLpmVbus => "CC_WLVBS",
    CcWaterLpmVbusTime => "CC_WLVTM",
    CcCcShort => "CC_CSHORT",
    CcSbuVbusShort => "CC_SVSHT",
    CcSbuGndShort => "CC_SGSHT",
    MuicAfcNak => "M_AFCNAK",
    MuicAfcError => "M_AFCERR",
    MuicDcdTimeout => "M_DCDTMO",
    FuelCount => "F_CNT",
    CcKiller => "CC_KILLER",
    CcFwError => "CC_FWERR",
    MuicB12Reset => "M_B12RS",
    CcPowerRoleSwap => "CC_PRS",
    CcDataRoleSwap => "CC_DRS",
    ClientAndroidRestart => "C_ARP",
    CcUnsupportedVbus => "CC_UMVS",
    HostSuperBandwidth => "H_SB",
    HostOverAudioDock => "H_OAD",
    CcVersion => "CC_VER",
}

/// Number of counters, including the firmware version slot
pub const HW_PARAM_COUNT: usize = HwParam::ALL.len();

/// Counters pulled from the event source before every counter dump
pub const PULLED_HW_PARAMS: [HwParam; 9] = [
    HwParam::CcWater,
    HwParam::CcDry,
    HwParam::ClientSuper,
    HwParam::ClientHigh,
    HwParam::CcWaterTime,
    HwParam::CcWaterVbus,
    HwParam::CcWaterLpmVbus,
    HwParam::CcWaterVbusTime,
    HwParam::CcWaterLpmVbusTime,
];

impl HwParam {
    /// Slot holding packed firmware version bytes instead of a count
    pub const VERSION: HwParam = HwParam::CcVersion;

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().find(|p| p.name() == name).copied()
    }
}

impl fmt::Display for HwParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
