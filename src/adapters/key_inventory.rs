use crate::adapters::memory::MemoryModel;
use crate::utils::error::{Result, TunerError};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Load a key inventory file into a [`MemoryModel`].
///
/// Accepted layouts:
/// - JSON array of key strings,
/// - JSON object mapping key to an arbitrary payload (e.g. shape info),
/// - plain text, one key per line; blank lines and `#` comments are skipped.
pub fn load_key_inventory<P: AsRef<Path>>(path: P) -> Result<MemoryModel> {
    let content = std::fs::read_to_string(&path)?;
    let model = parse_key_inventory(&content)?;
    tracing::debug!(
        "Loaded {} keys from {}",
        model.len(),
        path.as_ref().display()
    );
    Ok(model)
}

pub fn parse_key_inventory(content: &str) -> Result<MemoryModel> {
    let trimmed = content.trim_start();

    let keys: BTreeMap<String, Value> = if trimmed.starts_with('[') {
        let list: Vec<String> = serde_json::from_str(trimmed)?;
        list.into_iter().map(|k| (k, Value::Null)).collect()
    } else if trimmed.starts_with('{') {
        serde_json::from_str(trimmed)?
    } else {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| (line.to_string(), Value::Null))
            .collect()
    };

    if keys.is_empty() {
        return Err(TunerError::KeyInventoryError {
            message: "inventory contains no tensor keys".to_string(),
        });
    }

    Ok(MemoryModel::new(keys))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_plain_text_inventory() {
        let model = parse_key_inventory(
            "# clip keys\nclip_g.logit_scale\n\n  te.encoder.layers.3.mlp.fc1.weight  \n",
        )
        .unwrap();
        assert_eq!(
            model.keys().collect::<Vec<_>>(),
            ["clip_g.logit_scale", "te.encoder.layers.3.mlp.fc1.weight"]
        );
    }

    #[test]
    fn test_json_inventories() {
        let list = parse_key_inventory(r#"["a.weight", "b.bias"]"#).unwrap();
        assert_eq!(list.len(), 2);

        let object = parse_key_inventory(r#"{"a.weight": [320, 4, 3, 3]}"#).unwrap();
        assert_eq!(object.keys().collect::<Vec<_>>(), ["a.weight"]);
    }

    #[test]
    fn test_empty_inventory_is_an_error() {
        assert!(matches!(
            parse_key_inventory("# nothing\n"),
            Err(TunerError::KeyInventoryError { .. })
        ));
        assert!(matches!(
            parse_key_inventory("[1, 2]"),
            Err(TunerError::SerializationError(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "diffusion_model.middle_block.0.weight").unwrap();
        let model = load_key_inventory(file.path()).unwrap();
        assert_eq!(model.len(), 1);
    }
}
