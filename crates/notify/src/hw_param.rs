//! Hardware event counter store
//!
//! Holds one accumulator per [`HwParam`]. Counters only grow or are reset
//! to zero. A single lock guards the whole table so a bulk add never
//! interleaves with a single-counter accumulate.

use protocol::{HW_PARAM_COUNT, HwParam, NotifyError, Result};
use std::fmt::Write as _;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Rendered in place of a version slot with no backing storage
const EMPTY_VERSION: &str = "0000000000000000";

/// Counter table for one notify device
#[derive(Debug)]
pub struct HwParamStore {
    /// `None` when the counter storage was never allocated
    counters: Mutex<Option<Box<[u64; HW_PARAM_COUNT]>>>,
    /// Per-value ceiling accepted by [`HwParamStore::bulk_add`]
    data_limit: u64,
}

impl HwParamStore {
    /// Allocate a zeroed counter table
    pub fn new(data_limit: u64) -> Self {
        Self {
            counters: Mutex::new(Some(Box::new([0; HW_PARAM_COUNT]))),
            data_limit,
        }
    }

    /// A store without backing storage; every read yields zeros
    pub fn unallocated(data_limit: u64) -> Self {
        Self {
            counters: Mutex::new(None),
            data_limit,
        }
    }

    pub fn is_allocated(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Box<[u64; HW_PARAM_COUNT]>>> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add `delta` to one counter; a missing table leaves it untouched
    pub fn accumulate(&self, counter: HwParam, delta: u64) {
        if let Some(counters) = self.lock().as_mut() {
            let slot = &mut counters[counter.index()];
            *slot = slot.saturating_add(delta);
        }
    }

    /// Add `delta` to the counter with this name
    ///
    /// Returns false when the name is unknown.
    pub fn accumulate_named(&self, name: &str, delta: u64) -> bool {
        match HwParam::from_name(name) {
            Some(counter) => {
                self.accumulate(counter, delta);
                true
            }
            None => {
                debug!("Unknown hw param counter {}", name);
                false
            }
        }
    }

    /// Overwrite one slot; used for the firmware version
    pub fn set(&self, counter: HwParam, value: u64) {
        if let Some(counters) = self.lock().as_mut() {
            counters[counter.index()] = value;
        }
    }

    pub fn get(&self, counter: HwParam) -> u64 {
        self.lock()
            .as_ref()
            .map(|counters| counters[counter.index()])
            .unwrap_or(0)
    }

    /// Zero every counter
    pub fn reset_all(&self) {
        if let Some(counters) = self.lock().as_mut() {
            counters.fill(0);
        }
    }

    /// Add one value per counter, version slot excluded
    ///
    /// Either every counter is updated or none is: the whole input is
    /// validated against the ceiling before anything is added.
    pub fn bulk_add(&self, values: &[u64]) -> Result<()> {
        let expected = HW_PARAM_COUNT - 1;
        if values.len() < expected {
            return Err(NotifyError::ParseFailure(format!(
                "expected {} counter values, got {}",
                expected,
                values.len()
            )));
        }
        let values = &values[..expected];
        if let Some((index, value)) = values
            .iter()
            .enumerate()
            .find(|(_, value)| **value > self.data_limit)
        {
            warn!(
                "hw param {} value {} exceeds limit {}",
                index, value, self.data_limit
            );
            return Err(NotifyError::ParseFailure(format!(
                "counter {} value {} exceeds limit",
                index, value
            )));
        }

        let mut guard = self.lock();
        let counters = guard.as_mut().ok_or(NotifyError::AllocationFailure)?;
        for (slot, value) in counters.iter_mut().zip(values) {
            *slot = slot.saturating_add(*value);
        }
        Ok(())
    }

    /// Parse the space separated `usb_hw_param` form and bulk add it
    ///
    /// Each token contributes its leading decimal digits; a token without
    /// digits counts as zero.
    pub fn bulk_add_text(&self, text: &str) -> Result<()> {
        let values: Vec<u64> = text
            .split(' ')
            .take(HW_PARAM_COUNT - 1)
            .map(leading_decimal)
            .collect::<Result<_>>()?;
        self.bulk_add(&values)
    }

    /// All counters in index order, zeros when unallocated
    pub fn snapshot(&self) -> [u64; HW_PARAM_COUNT] {
        self.lock()
            .as_deref()
            .copied()
            .unwrap_or([0; HW_PARAM_COUNT])
    }

    /// Space separated dump of every counter, newline terminated
    pub fn render_numeric(&self) -> String {
        let values: Vec<String> = self.snapshot().iter().map(u64::to_string).collect();
        format!("{}\n", values.join(" "))
    }

    /// `"NAME":"value"` dump, skipping counters the predicate hides
    ///
    /// The version slot is rendered as packed firmware version hex digits.
    pub fn render_named(&self, is_skipped: impl Fn(HwParam) -> bool) -> String {
        let guard = self.lock();
        let counters = guard.as_deref();
        let mut out = String::new();

        for counter in &HwParam::ALL[..HW_PARAM_COUNT - 1] {
            if is_skipped(*counter) {
                continue;
            }
            let value = counters.map(|c| c[counter.index()]).unwrap_or(0);
            let _ = write!(out, "\"{}\":\"{}\",", counter.name(), value);
        }

        if is_skipped(HwParam::VERSION) {
            if out.ends_with(',') {
                out.pop();
            }
        } else {
            let version = counters
                .map(|c| format_version(c[HwParam::VERSION.index()]))
                .unwrap_or_else(|| EMPTY_VERSION.to_string());
            let _ = write!(out, "\"{}\":\"{}\"", HwParam::VERSION.name(), version);
        }
        out.push('\n');
        out
    }
}

fn leading_decimal(token: &str) -> Result<u64> {
    let digits: &str = token
        .find(|c: char| !c.is_ascii_digit())
        .map(|end| &token[..end])
        .unwrap_or(token);
    if digits.is_empty() {
        return Ok(0);
    }
    digits
        .parse()
        .map_err(|_| NotifyError::ParseFailure(format!("counter value {} out of range", digits)))
}

/// Render a packed firmware version as 16 hex digits
///
/// Bytes are taken from the value in little-endian order and printed as
/// hardware version `b3 b2 b1 b0`, main firmware `b6 b5 b4`, boot firmware `b7`.
pub fn format_version(packed: u64) -> String {
    let b = packed.to_le_bytes();
    format!(
        "{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}",
        b[3], b[2], b[1], b[0], b[6], b[5], b[4], b[7]
    )
}
