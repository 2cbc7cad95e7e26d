//! Process-wide boot state
//!
//! The boot layer and the boot loader's unnamed module exist once per
//! process. The unnamed module is created on first use. The boot layer is
//! set at most once with [`init_layer`]; reading it first with [`layer`]
//! freezes it as the empty layer.

use crate::layer::{Layer, LayerError};
use crate::unnamed::UnnamedModule;
use once_cell::sync::{Lazy, OnceCell};
use std::sync::Arc;
use tracing::info;

static UNNAMED_MODULE: Lazy<UnnamedModule> = Lazy::new(|| UnnamedModule::new(None));

static BOOT_LAYER: OnceCell<Arc<Layer>> = OnceCell::new();

/// Unnamed module of the boot loader
pub fn unnamed_module() -> &'static UnnamedModule {
    &UNNAMED_MODULE
}

/// Publish the boot layer
pub fn init_layer(layer: Layer) -> Result<Arc<Layer>, LayerError> {
    let layer = Arc::new(layer);
    BOOT_LAYER
        .set(layer.clone())
        .map_err(|_| LayerError::BootAlreadyInitialized)?;
    info!(
        modules = layer.configuration().len(),
        "boot layer initialized"
    );
    Ok(layer)
}

/// The boot layer, or the empty layer if none was published
pub fn layer() -> Arc<Layer> {
    BOOT_LAYER
        .get_or_init(|| Arc::new(Layer::empty()))
        .clone()
}

/// Check if the boot layer has been fixed
pub fn is_initialized() -> bool {
    BOOT_LAYER.get().is_some()
}
