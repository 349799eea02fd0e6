//! Lockscreen VID:PID allowlist
//!
//! Text of the form `"04E8:6860:18D1:4EE1"` lists allowed devices as pairs
//! of hexadecimal vendor and product ids. The list is rewritten by policy
//! updates while the enumeration path queries it, so both sides take the
//! same exclusive lock.

use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

/// Minimum characters of a vendor or product id token
const MIN_ID_LEN: usize = 4;

/// One allowed device identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DeviceIdPair {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl std::fmt::Display for DeviceIdPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor_id, self.product_id)
    }
}

/// Ordered, capacity bounded list of allowed identities
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IdAllowList {
    entries: Vec<DeviceIdPair>,
}

impl IdAllowList {
    pub fn entries(&self) -> &[DeviceIdPair] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, vendor_id: u16, product_id: u16) -> bool {
        self.entries
            .iter()
            .any(|e| e.vendor_id == vendor_id && e.product_id == product_id)
    }
}

fn parse_id(token: &str) -> Option<u16> {
    if token.len() < MIN_ID_LEN {
        return None;
    }
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    u16::from_str_radix(digits, 16).ok()
}

/// Parse `vid:pid` pairs, keeping at most `capacity` of them
///
/// Parsing halts at the first short or non-hex token, or at an incomplete
/// trailing pair; pairs accepted before that point are kept.
pub fn parse_id_allowlist(text: &str, capacity: usize) -> IdAllowList {
    let mut entries = Vec::new();
    let mut tokens = text.split(':');

    while entries.len() < capacity {
        let Some(vid_token) = tokens.next() else {
            break;
        };
        let Some(vendor_id) = parse_id(vid_token) else {
            warn!("allowlist: bad vid token {:?}", vid_token);
            break;
        };
        let Some(product_id) = tokens.next().and_then(parse_id) else {
            warn!("allowlist: missing or bad pid after {:04x}", vendor_id);
            break;
        };
        entries.push(DeviceIdPair {
            vendor_id,
            product_id,
        });
    }

    info!("allowlist valid_product_count = {}", entries.len());
    IdAllowList { entries }
}

/// Current VID:PID allowlist of a device, behind its own lock
#[derive(Debug)]
pub struct IdAllowPolicy {
    state: Mutex<IdPolicyState>,
    capacity: usize,
}

#[derive(Debug, Default)]
struct IdPolicyState {
    list: IdAllowList,
    text: String,
}

impl IdAllowPolicy {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(IdPolicyState::default()),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, IdPolicyState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the list wholesale, returning the number of pairs parsed
    ///
    /// `raw` is the text as written (kept for inspection), `pairs` the part
    /// after the routing prefix.
    pub fn replace(&self, raw: &str, pairs: &str) -> usize {
        let mut state = self.lock();
        state.list = parse_id_allowlist(pairs, self.capacity);
        state.text = raw.to_string();
        state.list.len()
    }

    pub fn contains(&self, vendor_id: u16, product_id: u16) -> bool {
        self.lock().list.contains(vendor_id, product_id)
    }

    pub fn list(&self) -> IdAllowList {
        self.lock().list.clone()
    }

    pub fn text(&self) -> String {
        self.lock().text.clone()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_pair() {
        let list = parse_id_allowlist("04E8:6860", 16);
        assert_eq!(
            list.entries(),
            &[DeviceIdPair {
                vendor_id: 0x04E8,
                product_id: 0x6860
            }]
        );
    }

    #[test]
    fn test_trailing_incomplete_pair() {
        let list = parse_id_allowlist("04E8:6860:05AC", 16);
        assert_eq!(list.len(), 1);
        assert!(list.contains(0x04E8, 0x6860));
    }

    #[test]
    fn test_bad_token_halts_parse() {
        let list = parse_id_allowlist("04E8:6860:ZZZZ:1234:18D1:4EE1", 16);
        assert_eq!(list.len(), 1);

        let list = parse_id_allowlist("04E8:686:18D1:4EE1", 16);
        assert!(list.is_empty());

        let list = parse_id_allowlist("104E8:6860", 16);
        assert!(list.is_empty());
    }

    #[test]
    fn test_capacity_bound() {
        let list = parse_id_allowlist("0001:0001:0002:0002:0003:0003", 2);
        assert_eq!(list.len(), 2);
        assert!(!list.contains(0x0003, 0x0003));
    }

    #[test]
    fn test_hex_prefix_and_case() {
        let list = parse_id_allowlist("0x18d1:4EE1", 4);
        assert!(list.contains(0x18D1, 0x4EE1));
    }

    #[test]
    fn test_policy_replace() {
        let policy = IdAllowPolicy::new(8);
        assert_eq!(policy.replace("VPID:04E8:6860", "04E8:6860"), 1);
        assert!(policy.contains(0x04E8, 0x6860));
        assert_eq!(policy.replace("VPID:18D1:4EE1", "18D1:4EE1"), 1);
        assert!(!policy.contains(0x04E8, 0x6860));
        assert!(policy.contains(0x18D1, 0x4EE1));
        assert_eq!(policy.text(), "VPID:18D1:4EE1");
    }
}

/// Property-based tests using proptest
#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn pairs_strategy() -> impl Strategy<Value = Vec<(u16, u16)>> {
        proptest::collection::vec((any::<u16>(), any::<u16>()), 0..24)
    }

    fn render(pairs: &[(u16, u16)]) -> String {
        pairs
            .iter()
            .map(|(vid, pid)| format!("{:04x}:{:04X}", vid, pid))
            .collect::<Vec<_>>()
            .join(":")
    }

    proptest! {
        /// Property: arbitrary text never panics and never exceeds capacity
        #[test]
        fn prop_bounded_by_capacity(text in "[0-9a-fA-FxX:]{0,80}|\\PC{0,40}", capacity in 0usize..8) {
            let list = parse_id_allowlist(&text, capacity);
            prop_assert!(list.len() <= capacity);
        }

        /// Property: well formed pairs are kept in order up to capacity
        #[test]
        fn prop_pairs_in_order(pairs in pairs_strategy(), capacity in 0usize..32) {
            let list = parse_id_allowlist(&render(&pairs), capacity);
            let expected: Vec<DeviceIdPair> = pairs
                .iter()
                .take(capacity)
                .map(|&(vendor_id, product_id)| DeviceIdPair { vendor_id, product_id })
                .collect();
            prop_assert_eq!(list.entries(), expected.as_slice());
        }

        /// Property: a trailing vendor id without a product id adds nothing
        #[test]
        fn prop_no_partial_pair(pairs in pairs_strategy(), trailing in any::<u16>()) {
            let complete = parse_id_allowlist(&render(&pairs), 100);
            let text = if pairs.is_empty() {
                format!("{:04x}", trailing)
            } else {
                format!("{}:{:04x}", render(&pairs), trailing)
            };
            let with_trailing = parse_id_allowlist(&text, 100);
            prop_assert_eq!(with_trailing, complete);
        }
    }
}
