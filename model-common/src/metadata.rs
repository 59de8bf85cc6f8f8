/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Model metadata bookkeeping across configuration loads.
//!
//! The light server models persist state sized by their compiled-in instance
//! counts.  A metadata record stores those counts next to the model state;
//! when the firmware is rebuilt with different counts the stored state no
//! longer fits and must be wiped.
//!
//! ```text
//!            init
//!             │
//!     ┌───────┴─────────┐
//!     ▼                 ▼
//! load_failed     metadata_stored
//!     │                 │
//!     └──► config_apply ◄┘
//! ```
//!
//! Persistence itself belongs to the [`ConfigStore`] collaborator; this
//! module only decides what to store, delete or clear.  The per-model init /
//! clear hooks are an explicit [`ModelHooks`] registration list.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

// ── Constants ─────────────────────────────────────────────────────────────────

/// Configuration file holding the model state.
pub const MODEL_FILE_ID: u16 = 0x0010;

/// Record id of the metadata entry inside [`MODEL_FILE_ID`].
pub const MODEL_COMMON_RECORD_ID: u16 = 0x0001;

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    /// Stored metadata does not match the compiled-in instance counts, or the
    /// stored model state had to be discarded.
    #[error("model metadata does not match the configured instance counts")]
    InvalidData,

    /// The configuration store refused an operation.
    #[error("configuration store error: {0}")]
    Store(String),
}

// ── Data ──────────────────────────────────────────────────────────────────────

/// Instance counts of the models whose state shares the model file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelMetadata {
    pub light_lightness_instance_count: u16,
    pub light_lc_instance_count: u16,
    pub light_ctl_instance_count: u16,
}

impl Default for ModelMetadata {
    fn default() -> Self {
        Self {
            light_lightness_instance_count: 1,
            light_lc_instance_count: 1,
            light_ctl_instance_count: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModelCommonStatus {
    pub metadata_stored: bool,
    pub load_failed: bool,
}

/// Notification from the configuration layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigEvent {
    /// Loading the given configuration file failed.
    LoadFailure { file: u16 },
}

// ── Collaborators ─────────────────────────────────────────────────────────────

/// Persistent configuration storage for the metadata record.
pub trait ConfigStore {
    /// Stored metadata record, if any.
    fn load_metadata(&self) -> Option<ModelMetadata>;

    fn set_metadata(&mut self, metadata: &ModelMetadata) -> Result<(), MetadataError>;

    fn delete_metadata(&mut self) -> Result<(), MetadataError>;

    /// Wipe the mesh stack configuration (network, keys, bindings).
    fn clear_stack_config(&mut self);
}

/// Init / clear hooks of one compiled-in model.  Both default to no-ops.
pub trait ModelLifecycle {
    fn name(&self) -> &str;

    /// Called from [`ModelCommon::init`].
    fn init(&mut self) {}

    /// Called when stored model state is discarded.
    fn clear(&mut self) {}
}

/// Registration list of model hooks, run in registration order.
#[derive(Default)]
pub struct ModelHooks {
    hooks: Vec<Box<dyn ModelLifecycle>>,
}

impl ModelHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, hook: Box<dyn ModelLifecycle>) -> &mut Self {
        self.hooks.push(hook);
        self
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    fn init_all(&mut self) {
        for hook in &mut self.hooks {
            debug!(model = hook.name(), "model init");
            hook.init();
        }
    }

    fn clear_all(&mut self) {
        for hook in &mut self.hooks {
            debug!(model = hook.name(), "model clear");
            hook.clear();
        }
    }
}

impl std::fmt::Debug for ModelHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.hooks.iter().map(|h| h.name()))
            .finish()
    }
}

// ── ModelCommon ───────────────────────────────────────────────────────────────

/// Owner of the metadata status and the model hooks.
#[derive(Debug)]
pub struct ModelCommon {
    expected: ModelMetadata,
    status: ModelCommonStatus,
    hooks: ModelHooks,
}

impl ModelCommon {
    /// Start tracking with the compiled-in instance counts and run every
    /// model's init hook.
    pub fn init(expected: ModelMetadata, mut hooks: ModelHooks) -> Self {
        hooks.init_all();
        info!(
            lightness = expected.light_lightness_instance_count,
            lc = expected.light_lc_instance_count,
            ctl = expected.light_ctl_instance_count,
            models = hooks.len(),
            "model common initialised"
        );
        Self {
            expected,
            status: ModelCommonStatus::default(),
            hooks,
        }
    }

    pub fn status(&self) -> ModelCommonStatus {
        self.status
    }

    /// React to a configuration layer event.  Only load failures of
    /// [`MODEL_FILE_ID`] are relevant.
    pub fn on_config_event(&mut self, event: &ConfigEvent) {
        match *event {
            ConfigEvent::LoadFailure { file } if file == MODEL_FILE_ID => {
                warn!(file, "model configuration failed to load");
                self.status.load_failed = true;
            }
            ConfigEvent::LoadFailure { file } => {
                debug!(file, "ignoring load failure of unrelated file");
            }
        }
    }

    /// Validate a metadata record being written or restored.
    ///
    /// # Errors
    /// [`MetadataError::InvalidData`] unless every count matches the
    /// compiled-in value.
    pub fn metadata_setter(&mut self, metadata: &ModelMetadata) -> Result<(), MetadataError> {
        if *metadata != self.expected {
            return Err(MetadataError::InvalidData);
        }
        self.status.metadata_stored = true;
        Ok(())
    }

    /// The metadata record describing this firmware.
    pub fn metadata_getter(&self) -> ModelMetadata {
        self.expected
    }

    /// Replay the stored record through the setter, as the configuration
    /// layer does at boot.  A rejected record is a load failure of the model
    /// file.
    pub fn restore(&mut self, store: &dyn ConfigStore) {
        let Some(stored) = store.load_metadata() else {
            debug!("no stored model metadata");
            return;
        };
        if self.metadata_setter(&stored).is_err() {
            warn!(?stored, expected = ?self.expected, "stored model metadata is stale");
            self.on_config_event(&ConfigEvent::LoadFailure {
                file: MODEL_FILE_ID,
            });
        }
    }

    /// Bring storage in line with the status collected since
    /// [`init`](Self::init).
    ///
    /// After a load failure the stack configuration and all model state are
    /// wiped, fresh metadata is stored and `InvalidData` is returned so the
    /// caller knows the device has to be reprovisioned.  Otherwise missing
    /// metadata is written.
    ///
    /// # Errors
    /// * [`MetadataError::InvalidData`] – stored state was discarded.
    /// * [`MetadataError::Store`] – writing the metadata record failed.
    pub fn config_apply(&mut self, store: &mut dyn ConfigStore) -> Result<(), MetadataError> {
        if self.status.load_failed {
            warn!("clearing stack and model configuration after load failure");
            store.clear_stack_config();
            self.hooks.clear_all();

            self.status.metadata_stored = false;
            if let Err(e) = store.delete_metadata() {
                debug!(error = %e, "deleting stale metadata failed");
            }

            self.metadata_store(store)?;
            return Err(MetadataError::InvalidData);
        }

        if !self.status.metadata_stored {
            info!("storing default model metadata");
            self.metadata_store(store)?;
        }

        Ok(())
    }

    fn metadata_store(&mut self, store: &mut dyn ConfigStore) -> Result<(), MetadataError> {
        let metadata = self.metadata_getter();
        store.set_metadata(&metadata)?;
        self.metadata_setter(&metadata)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::MemoryConfigStore;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Hook recording its calls into a shared log.
    struct Recorder {
        name: &'static str,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl ModelLifecycle for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn init(&mut self) {
            self.log.borrow_mut().push(format!("{}:init", self.name));
        }

        fn clear(&mut self) {
            self.log.borrow_mut().push(format!("{}:clear", self.name));
        }
    }

    /// Hook relying on the default no-op bodies.
    struct Silent;

    impl ModelLifecycle for Silent {
        fn name(&self) -> &str {
            "silent"
        }
    }

    fn hooks(log: &Rc<RefCell<Vec<String>>>) -> ModelHooks {
        let mut hooks = ModelHooks::new();
        for name in ["lightness", "lc", "ctl"] {
            hooks.register(Box::new(Recorder {
                name,
                log: Rc::clone(log),
            }));
        }
        hooks.register(Box::new(Silent));
        hooks
    }

    fn counts(lightness: u16, lc: u16, ctl: u16) -> ModelMetadata {
        ModelMetadata {
            light_lightness_instance_count: lightness,
            light_lc_instance_count: lc,
            light_ctl_instance_count: ctl,
        }
    }

    // ── init ──────────────────────────────────────────────────────────────────

    #[test]
    fn init_runs_hooks_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let common = ModelCommon::init(counts(1, 1, 1), hooks(&log));
        assert_eq!(*log.borrow(), ["lightness:init", "lc:init", "ctl:init"]);
        assert_eq!(common.status(), ModelCommonStatus::default());
    }

    // ── setter / getter ───────────────────────────────────────────────────────

    #[test]
    fn setter_accepts_matching_counts() {
        let mut common = ModelCommon::init(counts(2, 1, 3), ModelHooks::new());
        common.metadata_setter(&counts(2, 1, 3)).unwrap();
        assert!(common.status().metadata_stored);
    }

    #[test]
    fn setter_rejects_mismatching_counts() {
        let mut common = ModelCommon::init(counts(2, 1, 3), ModelHooks::new());
        assert_eq!(
            common.metadata_setter(&counts(2, 1, 4)),
            Err(MetadataError::InvalidData)
        );
        assert!(!common.status().metadata_stored);
    }

    #[test]
    fn getter_returns_compiled_in_counts() {
        let common = ModelCommon::init(counts(4, 5, 6), ModelHooks::new());
        assert_eq!(common.metadata_getter(), counts(4, 5, 6));
    }

    // ── events ────────────────────────────────────────────────────────────────

    #[test]
    fn load_failure_of_model_file_sets_flag() {
        let mut common = ModelCommon::init(counts(1, 1, 1), ModelHooks::new());
        common.on_config_event(&ConfigEvent::LoadFailure {
            file: MODEL_FILE_ID,
        });
        assert!(common.status().load_failed);
    }

    #[test]
    fn load_failure_of_other_file_is_ignored() {
        let mut common = ModelCommon::init(counts(1, 1, 1), ModelHooks::new());
        common.on_config_event(&ConfigEvent::LoadFailure { file: 0x0001 });
        assert!(!common.status().load_failed);
    }

    // ── config_apply ──────────────────────────────────────────────────────────

    #[test]
    fn first_boot_stores_default_metadata() {
        let mut store = MemoryConfigStore::new();
        let mut common = ModelCommon::init(counts(1, 2, 3), ModelHooks::new());
        common.restore(&store);
        common.config_apply(&mut store).unwrap();

        assert_eq!(store.metadata, Some(counts(1, 2, 3)));
        assert!(common.status().metadata_stored);
        assert_eq!(store.stack_clears, 0);
    }

    #[test]
    fn matching_stored_metadata_is_left_alone() {
        let mut store = MemoryConfigStore::new();
        store.metadata = Some(counts(1, 2, 3));
        let mut common = ModelCommon::init(counts(1, 2, 3), ModelHooks::new());
        common.restore(&store);
        assert!(common.status().metadata_stored);

        store.fail_writes = Some("must not be written".into());
        common.config_apply(&mut store).unwrap();
        assert_eq!(store.deletes, 0);
    }

    #[test]
    fn stale_metadata_wipes_configuration() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut store = MemoryConfigStore::new();
        store.metadata = Some(counts(1, 1, 1));

        let mut common = ModelCommon::init(counts(2, 2, 2), hooks(&log));
        common.restore(&store);
        assert!(common.status().load_failed);

        let result = common.config_apply(&mut store);
        assert_eq!(result, Err(MetadataError::InvalidData));
        assert_eq!(store.stack_clears, 1);
        assert_eq!(store.deletes, 1);
        assert_eq!(store.metadata, Some(counts(2, 2, 2)));
        assert!(common.status().metadata_stored);
        assert!(log.borrow().ends_with(&[
            "lightness:clear".to_string(),
            "lc:clear".to_string(),
            "ctl:clear".to_string(),
        ]));
    }

    #[test]
    fn store_failure_is_propagated() {
        let mut store = MemoryConfigStore::new();
        store.fail_writes = Some("flash full".into());
        let mut common = ModelCommon::init(counts(1, 1, 1), ModelHooks::new());
        let err = common.config_apply(&mut store).unwrap_err();
        assert_eq!(err, MetadataError::Store("flash full".into()));
        assert!(!common.status().metadata_stored);
    }

    #[test]
    fn hooks_debug_lists_names() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let rendered = format!("{:?}", hooks(&log));
        assert_eq!(rendered, r#"["lightness", "lc", "ctl", "silent"]"#);
    }
}
