//! Scene — top-level LUSID container
//!
//! A scene owns an ordered list of frames (ascending time), the time unit
//! those frames are expressed in, an optional sample rate, an optional
//! explicit duration and free-form metadata.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::SceneResult;
use crate::frame::Frame;
use crate::node::NodeKind;
use crate::time::TimeUnit;

/// Schema version written and expected by this crate
pub const SCHEMA_VERSION: &str = "0.5";

/// LUSID Scene v0.5
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    version: String,

    #[serde(rename = "timeUnit")]
    time_unit: TimeUnit,

    frames: Vec<Frame>,

    #[serde(rename = "sampleRate", skip_serializing_if = "Option::is_none")]
    sample_rate: Option<u32>,

    #[serde(skip_serializing_if = "Map::is_empty")]
    metadata: Map<String, Value>,

    #[serde(skip)]
    explicit_duration: Option<f64>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Scene {
    /// Create a v0.5 scene in seconds. Frames are sorted by time
    /// (stable, so equal timestamps keep their relative order).
    pub fn new(frames: Vec<Frame>) -> Self {
        let mut frames = frames;
        frames.sort_by(|a, b| a.time().partial_cmp(&b.time()).unwrap_or(std::cmp::Ordering::Equal));
        Self {
            version: SCHEMA_VERSION.to_string(),
            time_unit: TimeUnit::Seconds,
            frames,
            sample_rate: None,
            metadata: Map::new(),
            explicit_duration: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_time_unit(mut self, time_unit: TimeUnit) -> Self {
        self.time_unit = time_unit;
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: Option<u32>) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Duration override, in seconds, distinct from the last frame's time
    pub fn with_explicit_duration(mut self, seconds: Option<f64>) -> Self {
        self.explicit_duration = seconds;
        self
    }

    // -- Accessors --

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn time_unit(&self) -> TimeUnit {
        self.time_unit
    }

    pub fn sample_rate(&self) -> Option<u32> {
        self.sample_rate
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn explicit_duration(&self) -> Option<f64> {
        self.explicit_duration
    }

    // -- Queries --

    /// Duration in the scene's own unit (time of the last frame)
    pub fn duration(&self) -> f64 {
        self.frames.last().map(Frame::time).unwrap_or(0.0)
    }

    /// Duration converted to seconds
    pub fn duration_seconds(&self) -> SceneResult<f64> {
        self.time_unit.to_seconds(self.duration(), self.sample_rate)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Sorted, de-duplicated groups that contain at least one node of `kind`
    pub fn groups_of_kind(&self, kind: NodeKind) -> Vec<u32> {
        self.frames
            .iter()
            .flat_map(|f| f.nodes_by_kind(kind))
            .map(|n| n.group())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn audio_object_groups(&self) -> Vec<u32> {
        self.groups_of_kind(NodeKind::AudioObject)
    }

    pub fn direct_speaker_groups(&self) -> Vec<u32> {
        self.groups_of_kind(NodeKind::DirectSpeaker)
    }

    /// True if any frame contains an LFE node
    pub fn has_lfe(&self) -> bool {
        self.frames
            .iter()
            .any(|f| f.nodes_by_kind(NodeKind::Lfe).next().is_some())
    }

    /// Aggregate counts for reporting
    pub fn summary(&self) -> SceneSummary {
        let mut node_counts = Vec::new();
        for kind in NodeKind::ALL {
            let count: usize = self.frames.iter().map(|f| f.nodes_by_kind(kind).count()).sum();
            if count > 0 {
                node_counts.push((kind, count));
            }
        }

        SceneSummary {
            version: self.version.clone(),
            duration: self.duration(),
            time_unit: self.time_unit,
            sample_rate: self.sample_rate,
            frame_count: self.frame_count(),
            node_counts,
            audio_object_groups: self.audio_object_groups(),
            direct_speaker_groups: self.direct_speaker_groups(),
            has_lfe: self.has_lfe(),
        }
    }

    // -- Serialization --

    /// Canonical JSON value
    pub fn to_json_value(&self) -> SceneResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Canonical JSON text
    pub fn to_json_string(&self, pretty: bool) -> SceneResult<String> {
        let text = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(text)
    }
}

/// Write a scene as canonical JSON. The parent directory must already exist.
pub fn write_scene(scene: &Scene, path: impl AsRef<Path>, pretty: bool) -> SceneResult<()> {
    let text = scene.to_json_string(pretty)?;
    fs::write(path.as_ref(), text)?;
    log::debug!("Wrote LUSID scene: {}", path.as_ref().display());
    Ok(())
}

/// Human-readable scene digest
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSummary {
    pub version: String,
    pub duration: f64,
    pub time_unit: TimeUnit,
    pub sample_rate: Option<u32>,
    pub frame_count: usize,
    pub node_counts: Vec<(NodeKind, usize)>,
    pub audio_object_groups: Vec<u32>,
    pub direct_speaker_groups: Vec<u32>,
    pub has_lfe: bool,
}

impl fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "LUSID Scene v{}", self.version)?;
        writeln!(f, "  Duration: {:.3} {}", self.duration, self.time_unit)?;
        if let Some(rate) = self.sample_rate {
            writeln!(f, "  Sample Rate: {rate} Hz")?;
        }
        writeln!(f, "  Frames: {}", self.frame_count)?;
        if !self.node_counts.is_empty() {
            writeln!(f, "  Nodes:")?;
            for (kind, count) in &self.node_counts {
                writeln!(f, "    {kind}: {count}")?;
            }
        }
        if !self.audio_object_groups.is_empty() {
            writeln!(f, "  Audio Object Groups: {:?}", self.audio_object_groups)?;
        }
        if !self.direct_speaker_groups.is_empty() {
            writeln!(f, "  Direct Speaker Groups: {:?}", self.direct_speaker_groups)?;
        }
        if self.has_lfe {
            writeln!(f, "  LFE: present")?;
        }
        Ok(())
    }
}
