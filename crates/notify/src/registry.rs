//! Registry of notify devices
//!
//! Replaces a process-wide class object and device counter with an owned
//! table. Registration and unregistration take the table's write lock, so
//! one of them runs at a time. Attribute operations look the device up and
//! keep their own reference while they run: unregistering removes the entry
//! first, so new operations fail with [`NotifyError::NullDevice`] while
//! in-flight ones finish before the record is released.

use crate::capability::{LoggingController, NotifyController};
use crate::config::NotifyConfig;
use crate::device::NotifyDevice;
use protocol::{Attribute, NotifyError, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

/// Owned table of registered notify devices
#[derive(Debug)]
pub struct NotifyRegistry {
    config: NotifyConfig,
    devices: RwLock<HashMap<String, Arc<NotifyDevice>>>,
    device_count: AtomicU32,
}

impl NotifyRegistry {
    pub fn new(config: NotifyConfig) -> Self {
        Self {
            config,
            devices: RwLock::new(HashMap::new()),
            device_count: AtomicU32::new(0),
        }
    }

    pub fn config(&self) -> &NotifyConfig {
        &self.config
    }

    /// Create and publish a device in its registration state
    pub fn register(
        &self,
        name: &str,
        controller: Arc<dyn NotifyController>,
    ) -> Result<Arc<NotifyDevice>> {
        let mut devices = self.devices.write().unwrap_or_else(PoisonError::into_inner);
        if devices.contains_key(name) {
            return Err(NotifyError::DuplicateDevice(name.to_string()));
        }

        let index = self.device_count.fetch_add(1, Ordering::AcqRel) + 1;
        let device = Arc::new(NotifyDevice::new(name, index, controller, &self.config));
        devices.insert(name.to_string(), Arc::clone(&device));
        info!("Registered notify device {} (index {})", name, index);
        Ok(device)
    }

    /// Register every configured device against a [`LoggingController`]
    pub fn register_configured(&self) -> Result<Vec<Arc<NotifyDevice>>> {
        self.config
            .device_entries()
            .into_iter()
            .map(|entry| {
                let controller = LoggingController::new(entry.name.clone())
                    .with_host_support(entry.host_supported);
                self.register(&entry.name, Arc::new(controller))
            })
            .collect()
    }

    /// Detach a device from the attribute surface
    ///
    /// Returns the last table reference; the record is freed once every
    /// in-flight operation has dropped its own.
    pub fn unregister(&self, name: &str) -> Result<Arc<NotifyDevice>> {
        let device = self
            .devices
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .ok_or_else(|| NotifyError::NullDevice(name.to_string()))?;
        info!("Unregistered notify device {}", name);
        Ok(device)
    }

    pub fn device(&self, name: &str) -> Result<Arc<NotifyDevice>> {
        self.devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| NotifyError::NullDevice(name.to_string()))
    }

    /// Registered device names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read an attribute of a registered device
    pub fn show(&self, name: &str, attr: Attribute) -> Result<String> {
        self.device(name)?.show(attr)
    }

    /// Write an attribute of a registered device
    pub fn store(&self, name: &str, attr: Attribute, buf: &str) -> Result<usize> {
        self.device(name)?.store(attr, buf)
    }
}
