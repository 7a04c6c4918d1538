//! Providers shipped with this crate.
//!
//! Each provider module exposes a `register` function adding its factory to
//! a [`ProviderRegistry`]. [`register_all`] calls all of them.

pub mod gcolle;
pub mod muramura;
pub mod onepondo;
pub mod xslist;

pub use gcolle::Gcolle;
pub use muramura::MuraMura;
pub use xslist::Xslist;

use crate::registry::{ProviderRegistry, RegistryError};

/// Registers every builtin provider with `registry`.
pub fn register_all(registry: &mut ProviderRegistry) -> Result<(), RegistryError> {
    gcolle::register(registry)?;
    muramura::register(registry)?;
    xslist::register(registry)?;
    Ok(())
}
