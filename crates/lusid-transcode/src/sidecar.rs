//! Metadata sidecar — analysis and agent data grouped per source group
//!
//! ```text
//! {
//!   "version": "0.5",
//!   "timeUnit": "seconds",
//!   "groups": {
//!     "1": {
//!       "spectral_features": [ {"time": 0.0, "centroid": 5000.0, …}, … ],
//!       "agent_state":       [ {"time": 0.0, "mood": "calm", …}, … ]
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use lusid_scene::{Diagnostics, Node, Parsed, Payload, Scene, TimeUnit, round6};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::TranscodeResult;
use crate::render::frames_in_seconds;

/// One timed payload entry: `time` followed by the node's fields.
///
/// Payload keys win over the frame time, including a payload `time`.
#[derive(Debug, Clone, PartialEq)]
pub struct SidecarEntry {
    /// Seconds, rounded to 6 decimals
    pub time: f64,
    pub data: Payload,
}

impl Serialize for SidecarEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        // a payload `time` overrides the frame time, still written first
        match self.data.get("time") {
            Some(time) => map.serialize_entry("time", time)?,
            None => map.serialize_entry("time", &self.time)?,
        }
        for (key, value) in self.data.iter().filter(|(key, _)| key.as_str() != "time") {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Time series of one group, by node type
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupMetadata {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub spectral_features: Vec<SidecarEntry>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub agent_state: Vec<SidecarEntry>,
}

/// Non-audio scene data, separated from the render output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataSidecar {
    pub version: String,

    #[serde(rename = "timeUnit")]
    pub time_unit: TimeUnit,

    pub groups: BTreeMap<u32, GroupMetadata>,
}

impl MetadataSidecar {
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn group(&self, group: u32) -> Option<&GroupMetadata> {
        self.groups.get(&group)
    }

    pub fn to_json_string(&self, pretty: bool) -> TranscodeResult<String> {
        let text = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(text)
    }

    /// Write as JSON. The parent directory must already exist.
    pub fn write(&self, path: impl AsRef<Path>, pretty: bool) -> TranscodeResult<()> {
        fs::write(path.as_ref(), self.to_json_string(pretty)?)?;
        log::debug!("Wrote metadata sidecar: {}", path.as_ref().display());
        Ok(())
    }
}

/// Bucket every `spectral_features` and `agent_state` node by group and type.
///
/// Frames whose time cannot be converted to seconds are skipped, exactly as
/// in [`crate::transcode`].
pub fn extract_metadata_sidecar(scene: &Scene) -> Parsed<MetadataSidecar> {
    let mut diags = Diagnostics::new();
    let mut groups: BTreeMap<u32, GroupMetadata> = BTreeMap::new();

    for (seconds, frame) in frames_in_seconds(scene, &mut diags) {
        for node in frame.nodes() {
            let entry = |data: &Payload| SidecarEntry {
                time: round6(seconds),
                data: data.clone(),
            };
            match node {
                Node::SpectralFeatures { id, data } => groups
                    .entry(id.group)
                    .or_default()
                    .spectral_features
                    .push(entry(data)),
                Node::AgentState { id, data } => groups
                    .entry(id.group)
                    .or_default()
                    .agent_state
                    .push(entry(data)),
                _ => {}
            }
        }
    }

    log::debug!("Extracted metadata sidecar: {} groups", groups.len());

    Parsed::new(
        MetadataSidecar {
            version: scene.version().to_string(),
            time_unit: TimeUnit::Seconds,
            groups,
        },
        diags,
    )
}
