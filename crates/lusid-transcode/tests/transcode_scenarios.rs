//! Transcoder Test Suite
//!
//! Tests cover:
//! - Render instructions structure and sample rate
//! - Keyframe tracks per audio_object group
//! - LFE track convention
//! - Time unit conversion (ms, samples) and unconvertible frames
//! - Metadata sidecar grouping
//! - Writing output files

use approx::assert_relative_eq;
use lusid_scene::{Frame, Node, NodeId, Scene, TimeUnit, load_value};
use lusid_transcode::{
    Keyframe, SourceKey, TranscodeOptions, extract_metadata_sidecar, transcode,
};
use serde_json::{Value, json};

// ═══════════════════════════════════════════════════════════════════════════════
// TEST FIXTURES
// ═══════════════════════════════════════════════════════════════════════════════

/// Five frames: audio groups 1 and 2, spectral on group 1, agent on group 2,
/// LFE on group 3 in the first frame
fn sample_scene() -> Scene {
    let mut frames = Vec::new();
    for i in 0..5 {
        let t = f64::from(i);
        let mut nodes = vec![
            json!({"id": "1.1", "type": "audio_object", "cart": [t * 0.1, 1.0, 0.0]}),
            json!({"id": "2.1", "type": "audio_object", "cart": [-t * 0.1, 1.0, 0.0]}),
        ];
        if i < 4 {
            nodes.push(json!({"id": "1.2", "type": "spectral_features", "centroid": 5000.0 + t, "flux": 0.1}));
            nodes.push(json!({"id": "2.2", "type": "agent_state", "mood": "calm", "step": i}));
        }
        if i == 0 {
            nodes.push(json!({"id": "3.1", "type": "LFE"}));
        }
        frames.push(json!({"time": t, "nodes": nodes}));
    }

    let parsed = load_value(&json!({
        "version": "0.5",
        "sampleRate": 48000,
        "timeUnit": "seconds",
        "frames": frames
    }));
    assert!(parsed.diagnostics.is_empty());
    parsed.value
}

fn render_json(scene: &Scene) -> Value {
    let render = transcode(scene, &TranscodeOptions::default()).value;
    serde_json::to_value(&render).unwrap()
}

fn single_object_scene(unit: &str, sample_rate: Option<u32>, times: &[f64]) -> Scene {
    let frames: Vec<Value> = times
        .iter()
        .map(|t| json!({"time": t, "nodes": [{"id": "1.1", "type": "audio_object", "cart": [0.0, 1.0, 0.0]}]}))
        .collect();
    let mut raw = json!({"version": "0.5", "timeUnit": unit, "frames": frames});
    if let Some(rate) = sample_rate {
        raw["sampleRate"] = json!(rate);
    }
    load_value(&raw).value
}

// ═══════════════════════════════════════════════════════════════════════════════
// RENDER STRUCTURE TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_output_structure() {
    let out = render_json(&sample_scene());
    assert_eq!(out["sampleRate"], json!(48000));
    assert_eq!(out["timeUnit"], json!("seconds"));
    assert!(out["sources"].is_object());
}

#[test]
fn test_sources_named_by_group() {
    let out = render_json(&sample_scene());
    let names: Vec<&str> = out["sources"]
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert!(names.contains(&"src_1"));
    assert!(names.contains(&"src_2"));
    assert!(names.contains(&"LFE"));
    assert_eq!(names.len(), 3);
}

#[test]
fn test_keyframe_count_and_order() {
    let render = transcode(&sample_scene(), &TranscodeOptions::default()).value;
    for group in [1, 2] {
        let track = render.track(group).unwrap();
        assert_eq!(track.len(), 5);
        let times: Vec<f64> = track.iter().map(|k| k.time).collect();
        assert_eq!(times, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert!(track.iter().all(|k| k.cart.is_some()));
    }
    assert_eq!(render.source_count(), 2);
}

#[test]
fn test_positions_carried() {
    let render = transcode(&sample_scene(), &TranscodeOptions::default()).value;
    let cart = render.track(2).unwrap()[3].cart.unwrap();
    assert_relative_eq!(cart[0], -0.3);
    assert_relative_eq!(cart[1], 1.0);
}

#[test]
fn test_no_analysis_in_render_output() {
    let out = render_json(&sample_scene());
    for name in out["sources"].as_object().unwrap().keys() {
        assert!(!name.contains("spectral"));
        assert!(!name.contains("agent"));
    }
}

#[test]
fn test_gain_not_in_render_output() {
    let scene = load_value(&json!({
        "version": "0.5",
        "frames": [{"time": 0.0, "nodes": [
            {"id": "1.1", "type": "audio_object", "cart": [0, 1, 0], "gain": 0.5}
        ]}]
    }))
    .value;
    let out = render_json(&scene);
    assert_eq!(out["sources"]["src_1"], json!([{"time": 0.0, "cart": [0.0, 1.0, 0.0]}]));
}

#[test]
fn test_direct_speakers_not_tracks() {
    let scene = Scene::new(vec![Frame::new(
        0.0,
        vec![Node::direct_speaker(NodeId::new(1, 1), [-1.0, 1.0, 0.0], "RC_L", "")],
    )]);
    let render = transcode(&scene, &TranscodeOptions::default()).value;
    assert!(render.sources.is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════════
// LFE TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_lfe_track_exact() {
    // LFE anywhere → "LFE" track is exactly [{time: 0.0}]
    let scene = Scene::new(vec![
        Frame::new(0.0, vec![Node::audio_object(NodeId::new(1, 1), [0.0, 1.0, 0.0])]),
        Frame::new(7.0, vec![Node::lfe(NodeId::new(4, 1))]),
    ]);
    let render = transcode(&scene, &TranscodeOptions::default()).value;

    assert_eq!(render.lfe_track(), Some(&[Keyframe::lfe()][..]));
    let out = serde_json::to_value(&render).unwrap();
    assert_eq!(out["sources"]["LFE"], json!([{"time": 0.0}]));
    assert!(out["sources"]["LFE"][0].get("cart").is_none());
}

#[test]
fn test_lfe_in_many_frames_still_one_keyframe() {
    let scene = Scene::new(vec![
        Frame::new(0.0, vec![Node::lfe(NodeId::new(4, 1))]),
        Frame::new(1.0, vec![Node::lfe(NodeId::new(4, 1))]),
    ]);
    let render = transcode(&scene, &TranscodeOptions::default()).value;
    assert_eq!(render.lfe_track().unwrap().len(), 1);
    assert_eq!(render.source_count(), 0);
}

#[test]
fn test_no_lfe_when_absent() {
    let scene = single_object_scene("seconds", None, &[0.0]);
    let render = transcode(&scene, &TranscodeOptions::default()).value;
    assert!(!render.has_lfe());
    assert!(!render.sources.contains_key(&SourceKey::Lfe));
}

// ═══════════════════════════════════════════════════════════════════════════════
// TIME CONVERSION TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_time_conversion_ms() {
    // timeUnit "ms", frames at 0 and 1500 → src_1 at 0.0 and 1.5 seconds
    let scene = single_object_scene("ms", None, &[0.0, 1500.0]);
    assert_eq!(scene.time_unit(), TimeUnit::Milliseconds);

    let render = transcode(&scene, &TranscodeOptions::default()).value;
    let times: Vec<f64> = render.track(1).unwrap().iter().map(|k| k.time).collect();
    assert_eq!(times, vec![0.0, 1.5]);
}

#[test]
fn test_time_conversion_samples() {
    let scene = single_object_scene("samples", Some(48000), &[0.0, 48000.0, 72000.0]);
    let render = transcode(&scene, &TranscodeOptions::default()).value;
    let times: Vec<f64> = render.track(1).unwrap().iter().map(|k| k.time).collect();
    assert_eq!(times, vec![0.0, 1.0, 1.5]);
    assert_eq!(render.sample_rate, 48000);
}

#[test]
fn test_samples_without_rate_skips_frames() {
    let scene = single_object_scene("samples", None, &[0.0, 48000.0]);
    let parsed = transcode(&scene, &TranscodeOptions::default());

    assert!(parsed.value.sources.is_empty());
    assert_eq!(parsed.diagnostics.len(), 2);
    assert!(parsed.diagnostics.contains("skipping frame"));
    // falls back to the requested output rate
    assert_eq!(parsed.value.sample_rate, 48000);
}

#[test]
fn test_output_sample_rate_option() {
    let scene = single_object_scene("seconds", None, &[0.0]);
    let options = TranscodeOptions {
        output_sample_rate: 96000,
    };
    assert_eq!(transcode(&scene, &options).value.sample_rate, 96000);
}

// ═══════════════════════════════════════════════════════════════════════════════
// SIDECAR TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_sidecar_structure() {
    let sidecar = extract_metadata_sidecar(&sample_scene()).value;
    let value = serde_json::to_value(&sidecar).unwrap();
    assert_eq!(value["version"], json!("0.5"));
    assert_eq!(value["timeUnit"], json!("seconds"));
    assert!(value["groups"].is_object());
}

#[test]
fn test_sidecar_has_spectral_and_agent() {
    let sidecar = extract_metadata_sidecar(&sample_scene()).value;

    let group1 = sidecar.group(1).unwrap();
    assert_eq!(group1.spectral_features.len(), 4);
    assert!(group1.agent_state.is_empty());

    let group2 = sidecar.group(2).unwrap();
    assert_eq!(group2.agent_state.len(), 4);
    assert!(group2.spectral_features.is_empty());

    assert_eq!(sidecar.group_count(), 2);
}

#[test]
fn test_sidecar_entries_have_time_and_payload() {
    let sidecar = extract_metadata_sidecar(&sample_scene()).value;
    let value = serde_json::to_value(&sidecar).unwrap();

    let entries = value["groups"]["1"]["spectral_features"].as_array().unwrap();
    for (i, entry) in entries.iter().enumerate() {
        assert_eq!(entry["time"], json!(i as f64));
        assert!(entry.get("centroid").is_some());
        assert!(entry.get("id").is_none());
        assert!(entry.get("type").is_none());
    }
    assert_eq!(value["groups"]["2"]["agent_state"][3]["step"], json!(3));
}

#[test]
fn test_sidecar_payload_time_wins() {
    let scene = load_value(&json!({
        "version": "0.5",
        "frames": [
            {"time": 1.0, "nodes": [
                {"id": "1.2", "type": "spectral_features", "time": 99.0, "c": 1},
                {"id": "1.3", "type": "agent_state", "mood": "calm"}
            ]}
        ]
    }))
    .value;

    let value = serde_json::to_value(extract_metadata_sidecar(&scene).value).unwrap();
    assert_eq!(
        value["groups"]["1"]["spectral_features"][0],
        json!({"time": 99.0, "c": 1})
    );
    assert_eq!(
        value["groups"]["1"]["agent_state"][0],
        json!({"time": 1.0, "mood": "calm"})
    );
}

#[test]
fn test_no_audio_in_sidecar() {
    let value = serde_json::to_value(extract_metadata_sidecar(&sample_scene()).value).unwrap();
    for (_, group) in value["groups"].as_object().unwrap() {
        let kinds: Vec<&String> = group.as_object().unwrap().keys().collect();
        assert!(kinds.iter().all(|k| *k == "spectral_features" || *k == "agent_state"));
    }
}

#[test]
fn test_analysis_only_scene() {
    // Only analysis/agent nodes plus one audio_object: one track, no LFE,
    // sidecar holds exactly the non-audio entries
    let scene = load_value(&json!({
        "version": "0.5",
        "frames": [
            {"time": 0.0, "nodes": [
                {"id": "5.1", "type": "audio_object", "cart": [0, 1, 0]},
                {"id": "5.2", "type": "spectral_features", "centroid": 4000.0},
                {"id": "7.1", "type": "agent_state", "mood": "tense"}
            ]},
            {"time": 0.5, "nodes": [
                {"id": "5.2", "type": "spectral_features", "centroid": 4100.0}
            ]}
        ]
    }))
    .value;

    let render = transcode(&scene, &TranscodeOptions::default()).value;
    assert_eq!(render.sources.len(), 1);
    assert!(render.track(5).is_some());
    assert!(!render.has_lfe());

    let sidecar = serde_json::to_value(extract_metadata_sidecar(&scene).value).unwrap();
    assert_eq!(
        sidecar["groups"],
        json!({
            "5": {"spectral_features": [
                {"time": 0.0, "centroid": 4000.0},
                {"time": 0.5, "centroid": 4100.0}
            ]},
            "7": {"agent_state": [{"time": 0.0, "mood": "tense"}]}
        })
    );
}

#[test]
fn test_sidecar_time_converted() {
    let scene = load_value(&json!({
        "version": "0.5",
        "timeUnit": "milliseconds",
        "frames": [{"time": 250, "nodes": [{"id": "1.2", "type": "spectral_features", "flux": 0.2}]}]
    }))
    .value;
    let sidecar = extract_metadata_sidecar(&scene).value;
    assert_eq!(sidecar.group(1).unwrap().spectral_features[0].time, 0.25);
}

#[test]
fn test_sidecar_skips_unconvertible_frames() {
    let scene = load_value(&json!({
        "version": "0.5",
        "timeUnit": "samples",
        "frames": [{"time": 100, "nodes": [{"id": "1.2", "type": "spectral_features", "flux": 0.2}]}]
    }))
    .value;
    let parsed = extract_metadata_sidecar(&scene);
    assert!(parsed.value.is_empty());
    assert_eq!(parsed.diagnostics.len(), 1);
}

#[test]
fn test_empty_sidecar() {
    let scene = single_object_scene("seconds", None, &[0.0, 1.0]);
    let sidecar = extract_metadata_sidecar(&scene).value;
    assert!(sidecar.is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════════
// FILE OUTPUT TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_write_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let scene = sample_scene();

    let render_path = dir.path().join("renderInstructions.json");
    let render = transcode(&scene, &TranscodeOptions::default()).value;
    render.write(&render_path, true).unwrap();

    let sidecar_path = dir.path().join("metadata.json");
    extract_metadata_sidecar(&scene)
        .value
        .write(&sidecar_path, false)
        .unwrap();

    let written: Value =
        serde_json::from_str(&std::fs::read_to_string(&render_path).unwrap()).unwrap();
    assert_eq!(written, serde_json::to_value(&render).unwrap());

    let sidecar: Value =
        serde_json::from_str(&std::fs::read_to_string(&sidecar_path).unwrap()).unwrap();
    assert_eq!(sidecar["groups"].as_object().unwrap().len(), 2);
}
