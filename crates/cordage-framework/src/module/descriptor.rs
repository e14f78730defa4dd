use std::any::TypeId;
use std::sync::atomic::{AtomicBool, Ordering};

use super::ModuleInstance;

/// Registry record of one collected module.
///
/// Created once per module class with `enabled = true`. Only the lifecycle
/// operations flip the flag; dispatch reads it fresh on every call.
#[derive(Debug)]
pub struct ModuleDescriptor {
    name: String,
    dev_only: bool,
    enabled: AtomicBool,
    class_id: TypeId,
    instance: ModuleInstance,
}

impl ModuleDescriptor {
    pub fn new(
        name: impl Into<String>,
        dev_only: bool,
        class_id: TypeId,
        instance: ModuleInstance,
    ) -> Self {
        Self {
            name: name.into(),
            dev_only,
            enabled: AtomicBool::new(true),
            class_id,
            instance,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dev_only(&self) -> bool {
        self.dev_only
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Sets the enabled flag and returns the previous value.
    pub fn set_enabled(&self, enabled: bool) -> bool {
        self.enabled.swap(enabled, Ordering::AcqRel)
    }

    pub fn class_id(&self) -> TypeId {
        self.class_id
    }

    pub fn instance(&self) -> &ModuleInstance {
        &self.instance
    }
}
