//! MDM interface class allowlist
//!
//! Operators write colon separated class mnemonics (`"HUB:MAS:AUD"`); the
//! enumeration path asks whether an interface class is currently allowed.

use protocol::{CLASS_COUNT, MdmState, UsbClass};
use serde::Serialize;
use tracing::{debug, info};

/// Reserved token: allow only the hub class
const TOKEN_ABL: &str = "ABL";
/// Reserved token: class filtering off
const TOKEN_OFF: &str = "OFF";

/// Enabled flag per interface class slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClassAllowSet {
    enabled: [bool; CLASS_COUNT],
}

impl ClassAllowSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn enable(&mut self, class: UsbClass) {
        self.enabled[class.index()] = true;
    }

    pub fn contains(&self, class: UsbClass) -> bool {
        self.enabled[class.index()]
    }

    /// Number of enabled classes
    pub fn count(&self) -> usize {
        self.enabled.iter().filter(|e| **e).count()
    }

    pub fn classes(&self) -> impl Iterator<Item = UsbClass> + '_ {
        UsbClass::ALL.into_iter().filter(|c| self.contains(*c))
    }

    /// Render back to the colon separated text form
    pub fn to_text(&self) -> String {
        self.classes()
            .map(|c| c.mnemonic())
            .collect::<Vec<_>>()
            .join(":")
    }
}

/// Result of parsing one whitelist write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassPolicyUpdate {
    pub set: ClassAllowSet,
    /// Distinct classes matched by the text, before hub forcing
    pub matched: usize,
    pub mdm: MdmState,
}

/// Parse whitelist text into a fresh class set
///
/// `ABL` enables only the hub and turns the policy on; `OFF` enables nothing
/// and turns it off. Otherwise every `:` token of three or more characters
/// is matched against the class mnemonics by its first three characters.
/// Any match forces the hub class on, since downstream classes are only
/// reachable through a hub.
pub fn parse_class_policy(text: &str) -> ClassPolicyUpdate {
    let mut set = ClassAllowSet::empty();

    if text.starts_with(TOKEN_ABL) {
        set.enable(UsbClass::Hub);
        return ClassPolicyUpdate {
            set,
            matched: 0,
            mdm: MdmState::On,
        };
    }
    if text.starts_with(TOKEN_OFF) {
        return ClassPolicyUpdate {
            set,
            matched: 0,
            mdm: MdmState::Off,
        };
    }

    for token in text.split(':') {
        if token.len() < 3 {
            continue;
        }
        debug!("whitelist token = {}", token.get(..3).unwrap_or(token));
        if let Some(class) = UsbClass::from_mnemonic(token) {
            set.enable(class);
        }
    }

    let matched = set.count();
    info!("whitelist valid_class_count = {}", matched);
    let mdm = if matched > 0 {
        set.enable(UsbClass::Hub);
        MdmState::On
    } else {
        MdmState::Off
    };

    ClassPolicyUpdate { set, matched, mdm }
}

/// Current class policy of a device
#[derive(Debug, Clone, Default)]
pub struct ClassAllowPolicy {
    set: ClassAllowSet,
    /// Last written whitelist token, shown back on read
    text: String,
}

impl ClassAllowPolicy {
    /// Replace the policy with freshly parsed text
    pub fn replace(&mut self, text: &str) -> ClassPolicyUpdate {
        let update = parse_class_policy(text);
        self.set = update.set;
        self.text = text.to_string();
        update
    }

    pub fn contains(&self, class: UsbClass) -> bool {
        self.set.contains(class)
    }

    /// Membership by `bInterfaceClass` code; unknown codes are never allowed
    pub fn allows_class_code(&self, code: u8) -> bool {
        UsbClass::from_usb_class_code(code).is_some_and(|c| self.contains(c))
    }

    pub fn set(&self) -> ClassAllowSet {
        self.set
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hub_and_mass_storage() {
        let update = parse_class_policy("HUB:MAS");
        assert_eq!(update.matched, 2);
        assert_eq!(update.mdm, MdmState::On);
        assert!(update.set.contains(UsbClass::Hub));
        assert!(update.set.contains(UsbClass::MassStorage));
        assert_eq!(update.set.count(), 2);
    }

    #[test]
    fn test_short_token_is_skipped() {
        let update = parse_class_policy("XX");
        assert_eq!(update.matched, 0);
        assert_eq!(update.mdm, MdmState::Off);
        assert!(!update.set.contains(UsbClass::Hub));
    }

    #[test]
    fn test_match_forces_hub() {
        let update = parse_class_policy("MAS");
        assert_eq!(update.matched, 1);
        assert_eq!(update.mdm, MdmState::On);
        assert!(update.set.contains(UsbClass::Hub));
        assert!(update.set.contains(UsbClass::MassStorage));
    }

    #[test]
    fn test_reserved_tokens() {
        let abl = parse_class_policy("ABL");
        assert_eq!(abl.mdm, MdmState::On);
        assert_eq!(abl.set.classes().collect::<Vec<_>>(), vec![UsbClass::Hub]);

        let off = parse_class_policy("OFF:MAS");
        assert_eq!(off.mdm, MdmState::Off);
        assert_eq!(off.set.count(), 0);
    }

    #[test]
    fn test_unknown_and_duplicate_tokens() {
        let update = parse_class_policy("AUDIO:ZZZ:AUD:MA");
        assert_eq!(update.matched, 1);
        assert!(update.set.contains(UsbClass::Audio));
        assert_eq!(update.set.to_text(), "AUD:HUB");
    }

    #[test]
    fn test_replace_discards_previous() {
        let mut policy = ClassAllowPolicy::default();
        policy.replace("AUD:VID");
        assert!(policy.contains(UsbClass::Video));
        policy.replace("HID");
        assert!(!policy.contains(UsbClass::Video));
        assert!(policy.contains(UsbClass::Hid));
        assert!(policy.allows_class_code(0x03));
        assert!(policy.allows_class_code(0x09));
        assert!(!policy.allows_class_code(0x08));
        assert_eq!(policy.text(), "HID");
    }
}

/// Property-based tests using proptest
#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Strategy for whitelist text mixing real mnemonics and noise
    fn whitelist_strategy() -> impl Strategy<Value = String> {
        let token = prop_oneof![
            (0usize..CLASS_COUNT).prop_map(|i| UsbClass::ALL[i].mnemonic().to_string()),
            "[A-Z]{0,5}",
            "\\PC{0,4}",
        ];
        proptest::collection::vec(token, 0..12).prop_map(|tokens| tokens.join(":"))
    }

    proptest! {
        /// Property: MDM is on exactly when the hub ends up allowed
        #[test]
        fn prop_mdm_tracks_hub(text in whitelist_strategy()) {
            let update = parse_class_policy(&text);
            prop_assert!(update.set.count() <= CLASS_COUNT);
            prop_assert!(update.matched <= update.set.count());
            prop_assert_eq!(update.mdm == MdmState::On, update.set.contains(UsbClass::Hub));
        }

        /// Property: arbitrary text never panics and matches only listed prefixes
        #[test]
        fn prop_only_listed_classes(text in "\\PC{0,64}") {
            let update = parse_class_policy(&text);
            for class in update.set.classes() {
                if class == UsbClass::Hub {
                    continue;
                }
                prop_assert!(text.split(':').any(|t| t.starts_with(class.mnemonic())));
            }
        }

        /// Property: rendering a matched set and parsing it back is stable
        #[test]
        fn prop_to_text_reparses(text in whitelist_strategy()) {
            let update = parse_class_policy(&text);
            prop_assume!(update.matched > 0);
            let again = parse_class_policy(&update.set.to_text());
            prop_assert_eq!(again.set, update.set);
            prop_assert_eq!(again.mdm, MdmState::On);
        }
    }
}
