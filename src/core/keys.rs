//! Index extraction from host tensor keys.
//!
//! Key naming follows the host's state-dict layout, e.g.
//! `clip_g.transformer.text_model.encoder.layers.7.mlp.fc1.weight` or
//! `diffusion_model.output_blocks.3.1.proj_out.weight`.

use regex::Regex;
use std::sync::LazyLock;

static LAYER_INDEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.layers\.([0-9]+)\.").expect("layer index pattern"));
static INPUT_BLOCK_INDEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"input_blocks\.([0-9]+)\.").expect("input block pattern"));
static OUTPUT_BLOCK_INDEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"output_blocks\.([0-9]+)\.").expect("output block pattern"));

/// Parameters fixed by the architecture; never patched.
const FIXED_SUFFIXES: [&str; 2] = ["position_ids", "logit_scale"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Input,
    Middle,
    Output,
}

/// Block section a key belongs to, with the index when the section has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRef {
    pub kind: BlockKind,
    pub index: Option<u32>,
}

fn capture_index(re: &Regex, key: &str) -> Option<u32> {
    re.captures(key)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Text-encoder layer index from `….layers.<N>.…`.
pub fn parse_layer_index(key: &str) -> Option<u32> {
    capture_index(&LAYER_INDEX, key)
}

/// UNet block section of `key`.
///
/// Sections are tested in the order input, middle, output; the first
/// section name found in the key wins even if its index is unusable.
pub fn parse_block(key: &str) -> Option<BlockRef> {
    if key.contains("input_blocks") {
        Some(BlockRef {
            kind: BlockKind::Input,
            index: capture_index(&INPUT_BLOCK_INDEX, key),
        })
    } else if key.contains("middle_block") {
        Some(BlockRef {
            kind: BlockKind::Middle,
            index: None,
        })
    } else if key.contains("output_blocks") {
        Some(BlockRef {
            kind: BlockKind::Output,
            index: capture_index(&OUTPUT_BLOCK_INDEX, key),
        })
    } else {
        None
    }
}

/// True for `position_ids` / `logit_scale`, bare or as the last dotted component.
pub fn is_fixed_parameter(key: &str) -> bool {
    FIXED_SUFFIXES.iter().any(|suffix| {
        key.strip_suffix(suffix)
            .is_some_and(|head| head.is_empty() || head.ends_with('.'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_index() {
        assert_eq!(
            parse_layer_index("clip_g.transformer.text_model.encoder.layers.0.mlp.fc1.weight"),
            Some(0)
        );
        assert_eq!(parse_layer_index("te.encoder.layers.31.self_attn.q_proj.bias"), Some(31));
        assert_eq!(parse_layer_index("layers.3.weight"), None);
        assert_eq!(parse_layer_index("te.final_layer_norm.weight"), None);
        assert_eq!(parse_layer_index("te.layers.99999999999999.weight"), None);
    }

    #[test]
    fn test_parse_block() {
        assert_eq!(
            parse_block("diffusion_model.input_blocks.4.1.proj_in.weight"),
            Some(BlockRef { kind: BlockKind::Input, index: Some(4) })
        );
        assert_eq!(
            parse_block("diffusion_model.middle_block.1.norm.weight"),
            Some(BlockRef { kind: BlockKind::Middle, index: None })
        );
        assert_eq!(
            parse_block("diffusion_model.output_blocks.8.0.out_layers.3.weight"),
            Some(BlockRef { kind: BlockKind::Output, index: Some(8) })
        );
        assert_eq!(
            parse_block("diffusion_model.input_blocks.weight"),
            Some(BlockRef { kind: BlockKind::Input, index: None })
        );
        assert_eq!(parse_block("diffusion_model.time_embed.0.weight"), None);
    }

    #[test]
    fn test_fixed_parameters() {
        assert!(is_fixed_parameter("logit_scale"));
        assert!(is_fixed_parameter("clip_g.logit_scale"));
        assert!(is_fixed_parameter("clip_l.transformer.text_model.embeddings.position_ids"));
        assert!(!is_fixed_parameter("clip_g.my_logit_scale"));
        assert!(!is_fixed_parameter("clip_g.transformer.text_model.encoder.layers.0.mlp.fc1.weight"));
    }
}
