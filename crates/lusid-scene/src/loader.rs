//! Scene loader — validating, fault-tolerant JSON → [`Scene`]
//!
//! The loader never fails on malformed content. It drops the smallest unit
//! that is broken (node, then frame, then field → default) and records a
//! diagnostic. Only a missing file or text that is not JSON at all are errors.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::diagnostics::{DiagnosticStage, Diagnostics, Parsed};
use crate::error::{SceneError, SceneResult};
use crate::frame::Frame;
use crate::node::{Cart, InvalidNodeId, Node, NodeId, NodeKind, Payload};
use crate::scene::{SCHEMA_VERSION, Scene};
use crate::time::TimeUnit;

const STAGE: DiagnosticStage = DiagnosticStage::Loader;

/// Why a node or frame was left out of the loaded scene
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DropReason {
    #[error("node missing 'id', skipping: {0}")]
    MissingId(String),

    #[error("{0}, skipping")]
    InvalidId(#[from] InvalidNodeId),

    #[error("node '{0}' missing 'type', skipping")]
    MissingType(NodeId),

    #[error("node '{id}' has unknown type '{kind}', skipping")]
    UnknownType { id: NodeId, kind: String },

    #[error("{kind} '{id}' missing 'cart', skipping")]
    MissingCart { id: NodeId, kind: NodeKind },

    #[error("{kind} '{id}' 'cart' must be [x, y, z], skipping")]
    MalformedCart { id: NodeId, kind: NodeKind },

    #[error("{kind} '{id}' has NaN/Inf or non-numeric value in 'cart', skipping")]
    NonFiniteCart { id: NodeId, kind: NodeKind },

    #[error("frame at index {0} missing 'time', skipping")]
    MissingTime(usize),

    #[error("frame at index {index} has invalid time={value}, skipping")]
    InvalidTime { index: usize, value: String },
}

/// Load a scene file.
///
/// # Errors
///
/// [`SceneError::NotFound`] if the path does not exist, [`SceneError::Io`] if
/// it cannot be read, [`SceneError::Json`] if it is not valid JSON.
pub fn load_file(path: impl AsRef<Path>) -> SceneResult<Parsed<Scene>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(SceneError::NotFound(path.to_path_buf()));
    }
    let text = fs::read_to_string(path)?;
    log::debug!("Loading LUSID scene: {}", path.display());
    load_str(&text)
}

/// Load a scene from JSON text
pub fn load_str(text: &str) -> SceneResult<Parsed<Scene>> {
    let raw: Value = serde_json::from_str(text)?;
    Ok(load_value(&raw))
}

/// Load a scene from an already-parsed JSON value. Never fails.
pub fn load_value(raw: &Value) -> Parsed<Scene> {
    let mut diags = Diagnostics::new();

    let Some(root) = raw.as_object() else {
        diags.warn(STAGE, "top-level JSON is not an object, returning empty scene");
        return Parsed::new(Scene::default(), diags);
    };

    let version = parse_version(root, &mut diags);
    let time_unit = parse_time_unit(root, &mut diags);
    let sample_rate = parse_sample_rate(root, &mut diags);

    if time_unit == TimeUnit::Samples && sample_rate.is_none() {
        diags.warn(
            STAGE,
            "timeUnit is 'samples' but no valid sampleRate provided; time conversion to seconds will fail",
        );
    }

    let metadata = parse_metadata(root, &mut diags);

    let raw_frames = match root.get("frames") {
        None => {
            diags.warn(STAGE, "missing 'frames' array, scene will be empty");
            &[][..]
        }
        Some(Value::Array(frames)) => frames.as_slice(),
        Some(_) => {
            diags.warn(STAGE, "'frames' is not a list, scene will be empty");
            &[][..]
        }
    };

    let mut frames = Vec::with_capacity(raw_frames.len());
    for (index, raw_frame) in raw_frames.iter().enumerate() {
        let Some(raw_frame) = raw_frame.as_object() else {
            diags.warn(STAGE, format!("frame at index {index} is not an object, skipping"));
            continue;
        };
        match frame_from_json(raw_frame, index, &mut diags) {
            Ok(frame) => frames.push(frame),
            Err(reason) => diags.warn(STAGE, reason.to_string()),
        }
    }

    let scene = Scene::new(frames)
        .with_version(version)
        .with_time_unit(time_unit)
        .with_sample_rate(sample_rate)
        .with_metadata(metadata);

    log::debug!(
        "Loaded scene: {} frames, {} diagnostics",
        scene.frame_count(),
        diags.len()
    );

    Parsed::new(scene, diags)
}

fn parse_version(root: &Map<String, Value>, diags: &mut Diagnostics) -> String {
    let version = match root.get("version") {
        None | Some(Value::Null) => {
            diags.warn(STAGE, format!("missing 'version' field, assuming '{SCHEMA_VERSION}'"));
            return SCHEMA_VERSION.to_string();
        }
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    if version != SCHEMA_VERSION {
        diags.warn(
            STAGE,
            format!("expected version '{SCHEMA_VERSION}', got '{version}'; attempting to parse anyway"),
        );
    }
    version
}

fn parse_time_unit(root: &Map<String, Value>, diags: &mut Diagnostics) -> TimeUnit {
    let raw = match root.get("timeUnit") {
        None => return TimeUnit::Seconds,
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    raw.parse().unwrap_or_else(|e| {
        diags.warn(STAGE, format!("{e}, defaulting to 'seconds'"));
        TimeUnit::Seconds
    })
}

fn parse_sample_rate(root: &Map<String, Value>, diags: &mut Diagnostics) -> Option<u32> {
    let raw = root.get("sampleRate")?;
    let rate = raw
        .as_f64()
        .filter(|r| r.is_finite() && *r >= 1.0 && *r <= f64::from(u32::MAX))
        .map(|r| r.trunc() as u32);
    if rate.is_none() {
        diags.warn(STAGE, format!("invalid sampleRate={raw}, ignoring"));
    }
    rate
}

fn parse_metadata(root: &Map<String, Value>, diags: &mut Diagnostics) -> Map<String, Value> {
    match root.get("metadata") {
        None => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(_) => {
            diags.warn(STAGE, "'metadata' is not an object, ignoring");
            Map::new()
        }
    }
}

/// Build one frame, folding node-level drops into diagnostics
fn frame_from_json(
    raw: &Map<String, Value>,
    index: usize,
    diags: &mut Diagnostics,
) -> Result<Frame, DropReason> {
    let time = match raw.get("time") {
        None | Some(Value::Null) => return Err(DropReason::MissingTime(index)),
        Some(value) => finite_number(value).ok_or_else(|| DropReason::InvalidTime {
            index,
            value: value.to_string(),
        })?,
    };

    let raw_nodes = match raw.get("nodes") {
        None => {
            diags.warn(STAGE, format!("frame at time={time} missing 'nodes', treating as empty"));
            &[][..]
        }
        Some(Value::Array(nodes)) => nodes.as_slice(),
        Some(_) => {
            diags.warn(STAGE, format!("frame at time={time} 'nodes' is not a list, treating as empty"));
            &[][..]
        }
    };

    let mut frame = Frame::new(time, Vec::new());
    for raw_node in raw_nodes {
        let Some(raw_node) = raw_node.as_object() else {
            diags.warn(STAGE, format!("frame at time={time}: non-object node entry, skipping"));
            continue;
        };
        match node_from_json(raw_node, diags) {
            Ok(node) => {
                let id = node.id();
                if frame.insert(node).is_some() {
                    diags.warn(
                        STAGE,
                        format!("frame at time={time}: duplicate node id '{id}', keeping last"),
                    );
                }
            }
            Err(reason) => diags.warn(STAGE, reason.to_string()),
        }
    }

    Ok(frame)
}

/// Build one typed node from its JSON object. Field-level fallbacks that
/// keep the node (such as an unusable `gain`) are recorded in `diags`.
pub fn node_from_json(
    raw: &Map<String, Value>,
    diags: &mut Diagnostics,
) -> Result<Node, DropReason> {
    let id_text = match raw.get("id") {
        None | Some(Value::Null) => {
            return Err(DropReason::MissingId(Value::Object(raw.clone()).to_string()));
        }
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    let id: NodeId = id_text.parse()?;

    let kind = match raw.get("type") {
        None | Some(Value::Null) => return Err(DropReason::MissingType(id)),
        Some(Value::String(s)) => s
            .parse::<NodeKind>()
            .map_err(|kind| DropReason::UnknownType { id, kind })?,
        Some(other) => {
            return Err(DropReason::UnknownType {
                id,
                kind: other.to_string(),
            });
        }
    };

    let node = match kind {
        NodeKind::AudioObject => Node::AudioObject {
            id,
            cart: parse_cart(raw, id, kind)?,
            gain: parse_gain(raw, id, diags),
        },
        NodeKind::DirectSpeaker => Node::DirectSpeaker {
            id,
            cart: parse_cart(raw, id, kind)?,
            speaker_label: optional_string(raw, "speakerLabel"),
            channel_id: optional_string(raw, "channelID"),
        },
        NodeKind::Lfe => Node::Lfe { id },
        NodeKind::SpectralFeatures => Node::SpectralFeatures {
            id,
            data: payload(raw),
        },
        NodeKind::AgentState => Node::AgentState {
            id,
            data: payload(raw),
        },
    };

    Ok(node)
}

fn parse_cart(raw: &Map<String, Value>, id: NodeId, kind: NodeKind) -> Result<Cart, DropReason> {
    let values = match raw.get("cart") {
        None | Some(Value::Null) => return Err(DropReason::MissingCart { id, kind }),
        Some(Value::Array(values)) if values.len() == 3 => values,
        Some(_) => return Err(DropReason::MalformedCart { id, kind }),
    };

    let mut cart = [0.0; 3];
    for (slot, value) in cart.iter_mut().zip(values) {
        *slot = finite_number(value).ok_or(DropReason::NonFiniteCart { id, kind })?;
    }
    Ok(cart)
}

/// `gain` defaults to unity; a present but unusable value also falls back to unity
fn parse_gain(raw: &Map<String, Value>, id: NodeId, diags: &mut Diagnostics) -> f64 {
    match raw.get("gain") {
        None => 1.0,
        Some(value) => finite_number(value).unwrap_or_else(|| {
            diags.warn(
                STAGE,
                format!("audio_object '{id}' has invalid gain={value}, defaulting to 1.0"),
            );
            1.0
        }),
    }
}

fn optional_string(raw: &Map<String, Value>, key: &str) -> String {
    raw.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}

/// Every field except `id` and `type`, verbatim
fn payload(raw: &Map<String, Value>) -> Payload {
    raw.iter()
        .filter(|(key, _)| key.as_str() != "id" && key.as_str() != "type")
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn finite_number(value: &Value) -> Option<f64> {
    value.as_f64().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(raw: Value) -> Result<Node, DropReason> {
        node_from_json(raw.as_object().unwrap(), &mut Diagnostics::new())
    }

    #[test]
    fn test_node_missing_id() {
        assert!(matches!(
            node(json!({"type": "LFE"})),
            Err(DropReason::MissingId(_))
        ));
    }

    #[test]
    fn test_node_numeric_id_accepted() {
        let n = node(json!({"id": 1.1, "type": "LFE"})).unwrap();
        assert_eq!(n.id(), NodeId::new(1, 1));
    }

    #[test]
    fn test_node_bad_id() {
        let err = node(json!({"id": "bad", "type": "LFE"})).unwrap_err();
        assert!(err.to_string().contains("'bad'"));
    }

    #[test]
    fn test_node_unknown_type() {
        let err = node(json!({"id": "1.1", "type": "reverb_zone"})).unwrap_err();
        assert!(matches!(err, DropReason::UnknownType { ref kind, .. } if kind == "reverb_zone"));
    }

    #[test]
    fn test_cart_validation() {
        assert!(matches!(
            node(json!({"id": "1.1", "type": "audio_object"})),
            Err(DropReason::MissingCart { .. })
        ));
        assert!(matches!(
            node(json!({"id": "1.1", "type": "audio_object", "cart": [0.0, 1.0]})),
            Err(DropReason::MalformedCart { .. })
        ));
        assert!(matches!(
            node(json!({"id": "1.1", "type": "audio_object", "cart": "front"})),
            Err(DropReason::MalformedCart { .. })
        ));
        assert!(matches!(
            node(json!({"id": "1.1", "type": "direct_speaker", "cart": [0.0, null, 1.0]})),
            Err(DropReason::NonFiniteCart { .. })
        ));
    }

    #[test]
    fn test_gain_fallback() {
        let mut diags = Diagnostics::new();
        let raw = json!({"id": "1.1", "type": "audio_object", "cart": [0, 1, 0], "gain": "loud"});
        let n = node_from_json(raw.as_object().unwrap(), &mut diags).unwrap();
        assert!(matches!(n, Node::AudioObject { gain, .. } if gain == 1.0));
        assert_eq!(diags.len(), 1);
        assert!(diags.contains("invalid gain"));

        let n = node(json!({"id": "1.1", "type": "audio_object", "cart": [0, 1, 0], "gain": 0.25}))
            .unwrap();
        assert!(matches!(n, Node::AudioObject { gain, .. } if gain == 0.25));
    }

    #[test]
    fn test_payload_excludes_id_and_type() {
        let n = node(json!({"id": "2.1", "type": "agent_state", "mood": "calm", "energy": 0.7}))
            .unwrap();
        let data = n.payload().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data["mood"], json!("calm"));
        assert!(!data.contains_key("id"));
    }

    #[test]
    fn test_non_object_root() {
        let parsed = load_value(&json!([1, 2, 3]));
        assert_eq!(parsed.value.frame_count(), 0);
        assert_eq!(parsed.diagnostics.len(), 1);
    }

    #[test]
    fn test_sample_rate_validation() {
        let parsed = load_value(&json!({"version": "0.5", "sampleRate": -1, "frames": []}));
        assert_eq!(parsed.value.sample_rate(), None);
        assert!(parsed.diagnostics.contains("invalid sampleRate"));

        let parsed = load_value(&json!({"version": "0.5", "sampleRate": 44100, "frames": []}));
        assert_eq!(parsed.value.sample_rate(), Some(44100));
        assert!(parsed.diagnostics.is_empty());
    }

    #[test]
    fn test_samples_without_rate_warns() {
        let parsed = load_value(&json!({"version": "0.5", "timeUnit": "samples", "frames": []}));
        assert_eq!(parsed.value.time_unit(), TimeUnit::Samples);
        assert!(parsed.diagnostics.contains("no valid sampleRate"));
    }
}
