use std::collections::HashMap;

/// Host-side model or text encoder that accepts weight patches.
///
/// Tuners never touch the caller's instance: they call [`clone_model`]
/// first and only ever patch the clone.
///
/// [`clone_model`]: PatchableModel::clone_model
pub trait PatchableModel: Sized {
    /// Opaque per-key patch payload owned by the host.
    type Patch: Clone;

    /// Independent copy that can be patched without affecting `self`.
    fn clone_model(&self) -> Self;

    /// Patchable tensor keys, optionally restricted to those starting with `prefix`.
    fn key_patches(&self, prefix: Option<&str>) -> HashMap<String, Self::Patch>;

    /// Apply `patches` scaled by `strength`, with the host's own blend `weight`.
    fn add_patches(&mut self, patches: HashMap<String, Self::Patch>, strength: f64, weight: f64);
}
