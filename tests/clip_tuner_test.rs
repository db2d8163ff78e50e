use sdxl_tuner::{ClipTuner, ClipWeights, MemoryModel, Mode, TunerNode};

fn layer_key(index: u32) -> String {
    format!(
        "clip_g.transformer.text_model.encoder.layers.{}.mlp.fc1.weight",
        index
    )
}

fn text_encoder() -> MemoryModel {
    let mut keys: Vec<String> = (0..32).map(layer_key).collect();
    keys.push("clip_g.transformer.text_model.embeddings.position_ids".to_string());
    keys.push("clip_g.logit_scale".to_string());
    keys.push("clip_g.transformer.text_model.final_layer_norm.weight".to_string());
    MemoryModel::from_keys(keys)
}

#[test]
fn test_real_value_band_scenario() {
    let clip = text_encoder();
    let weights = ClipWeights {
        mode: Mode::RealValue,
        base_scale: 1.0,
        syntax: 1.5,
        semantic: 1.0,
        style: 0.5,
    };

    let tuned = ClipTuner.tune(&clip, &weights);
    let report = &tuned.report;

    for layer in 0..=11 {
        let patch = report.patch_for(&layer_key(layer)).expect("syntax layer patched");
        assert_eq!(patch.strength, 0.5);
        assert_eq!(patch.target, "Syntax");
    }
    for layer in 12..=24 {
        assert!(report.patch_for(&layer_key(layer)).is_none(), "layer {}", layer);
    }
    for layer in 25..32 {
        let patch = report.patch_for(&layer_key(layer)).expect("style layer patched");
        assert_eq!(patch.strength, -0.5);
        assert_eq!(patch.target, "Style");
    }

    assert!(report
        .patch_for("clip_g.transformer.text_model.embeddings.position_ids")
        .is_none());
    assert!(report.patch_for("clip_g.logit_scale").is_none());
    assert!(report
        .patch_for("clip_g.transformer.text_model.final_layer_norm.weight")
        .is_none());

    assert_eq!(report.patch_count(), 12 + 7);
    assert_eq!(report.excluded, 2);
    assert_eq!(report.keys_seen, 35);

    assert_eq!(tuned.model.applied().len(), 19);
    assert_eq!(tuned.model.net_strength(&layer_key(3)), 0.5);
    assert!(clip.applied().is_empty());
}

#[test]
fn test_neutral_sliders_emit_nothing() {
    let clip = text_encoder();
    for mode in [Mode::SoftValue, Mode::RealValue] {
        let weights = ClipWeights {
            mode,
            ..ClipWeights::default()
        };
        let tuned = ClipTuner.tune(&clip, &weights);

        assert_eq!(tuned.report.patch_count(), 0);
        assert!(tuned.model.applied().is_empty());
        assert_eq!(tuned.model, clip);
    }
}

#[test]
fn test_fixed_parameters_ignore_base_scale() {
    let clip = text_encoder();
    let weights = ClipWeights {
        mode: Mode::RealValue,
        base_scale: 2.0,
        ..ClipWeights::default()
    };

    let tuned = ClipTuner.tune(&clip, &weights);
    let report = &tuned.report;

    // Only the untyped final norm follows base_scale.
    assert_eq!(report.patch_count(), 1);
    let patch = report
        .patch_for("clip_g.transformer.text_model.final_layer_norm.weight")
        .unwrap();
    assert_eq!(patch.target, "base");
    assert_eq!(patch.strength, 1.0);
}

#[test]
fn test_soft_mode_info_string() {
    let clip = text_encoder();
    let weights = ClipWeights {
        syntax: 2.0,
        semantic: 0.0,
        style: 1.0,
        ..ClipWeights::default()
    };

    let tuned = ClipTuner.tune(&clip, &weights);
    assert_eq!(
        tuned.info(),
        "CLIP tuned | Syn: 1.20 | Sem: 0.80 | Sty: 1.00 | Patches: 25"
    );

    let syntax = tuned.report.patch_for(&layer_key(0)).unwrap();
    assert!((syntax.strength - 0.2).abs() < 1e-9);
    let semantic = tuned.report.patch_for(&layer_key(20)).unwrap();
    assert!((semantic.strength + 0.2).abs() < 1e-9);

    let (model, info) = tuned.into_outputs();
    assert_eq!(model.applied().len(), 25);
    assert!(info.starts_with("CLIP tuned"));
}
