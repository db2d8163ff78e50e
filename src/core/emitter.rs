use crate::domain::model::PatchRecord;
use crate::domain::ports::PatchableModel;
use std::collections::HashMap;

/// Blend weight passed to the host alongside every strength.
pub const PATCH_WEIGHT: f64 = 1.0;

/// Group a key resolved to and the multiplier that group carries.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub label: String,
    pub multiplier: f64,
}

impl Target {
    pub fn new(label: impl Into<String>, multiplier: f64) -> Self {
        Self {
            label: label.into(),
            multiplier,
        }
    }

    pub fn strength(&self) -> f64 {
        self.multiplier - 1.0
    }
}

/// Outcome of one pass over a model's keys.
#[derive(Debug, Clone)]
pub struct Emission<M> {
    pub model: M,
    pub patches: Vec<PatchRecord>,
    pub keys_seen: usize,
    pub skipped_neutral: usize,
    pub excluded: usize,
}

/// Clone `model` and patch every key `resolve` maps to a non-neutral multiplier.
///
/// `resolve` returns `None` for keys that must never be patched. Keys are
/// visited in sorted order so the patch list is stable regardless of how
/// the host hands them out.
pub fn emit<M, F>(model: &M, prefix: Option<&str>, mut resolve: F) -> Emission<M>
where
    M: PatchableModel,
    F: FnMut(&str) -> Option<Target>,
{
    let mut tuned = model.clone_model();

    let mut key_patches: Vec<(String, M::Patch)> = tuned.key_patches(prefix).into_iter().collect();
    key_patches.sort_by(|a, b| a.0.cmp(&b.0));

    let keys_seen = key_patches.len();
    let mut patches = Vec::new();
    let mut skipped_neutral = 0;
    let mut excluded = 0;

    for (key, patch) in key_patches {
        let Some(target) = resolve(&key) else {
            tracing::debug!("Excluded fixed parameter {}", key);
            excluded += 1;
            continue;
        };

        let strength = target.strength();
        if strength == 0.0 {
            skipped_neutral += 1;
            continue;
        }

        tracing::debug!("Patching {} [{}] strength {:+.4}", key, target.label, strength);
        tuned.add_patches(HashMap::from([(key.clone(), patch)]), strength, PATCH_WEIGHT);
        patches.push(PatchRecord {
            key,
            target: target.label,
            multiplier: target.multiplier,
            strength,
        });
    }

    Emission {
        model: tuned,
        patches,
        keys_seen,
        skipped_neutral,
        excluded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryModel;

    fn model() -> MemoryModel {
        MemoryModel::from_keys(["a.weight", "b.weight", "c.weight", "skip.me"])
    }

    #[test]
    fn test_neutral_keys_are_elided() {
        let source = model();
        let emission = emit(&source, None, |key| match key {
            "a.weight" => Some(Target::new("up", 1.25)),
            "skip.me" => None,
            _ => Some(Target::new("base", 1.0)),
        });

        assert_eq!(emission.keys_seen, 4);
        assert_eq!(emission.excluded, 1);
        assert_eq!(emission.skipped_neutral, 2);
        assert_eq!(emission.patches.len(), 1);
        assert_eq!(emission.patches[0].key, "a.weight");
        assert_eq!(emission.patches[0].strength, 0.25);

        let applied = emission.model.applied();
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].weight, PATCH_WEIGHT);
    }

    #[test]
    fn test_source_model_is_untouched() {
        let source = model();
        let emission = emit(&source, None, |_| Some(Target::new("down", 0.5)));

        assert_eq!(emission.model.applied().len(), 4);
        assert!(source.applied().is_empty());
    }

    #[test]
    fn test_prefix_limits_enumeration() {
        let source = MemoryModel::from_keys(["diffusion_model.x", "first_stage_model.y"]);
        let emission = emit(&source, Some("diffusion_model."), |_| Some(Target::new("g", 2.0)));

        assert_eq!(emission.keys_seen, 1);
        assert_eq!(emission.patches[0].key, "diffusion_model.x");
    }
}
