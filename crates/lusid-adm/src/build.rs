//! Scene builder — extracted ADM records → canonical LUSID scene
//!
//! Group numbering is fixed by document order: direct speakers take groups
//! 1..=N, object channels continue from N+1. A silent channel emits no node
//! but still consumes its group number, so numbering never depends on the
//! activity map.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use lusid_scene::{DiagnosticStage, Diagnostics, Frame, Node, NodeId, Parsed, Scene, TimeUnit};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::activity::ChannelActivity;
use crate::error::{AdmError, AdmResult};
use crate::extract::{AdmExtraction, DirectSpeakerRecord, extract};
use crate::timecode::parse_timecode;
use crate::xml::AdmDocument;

const STAGE: DiagnosticStage = DiagnosticStage::Builder;

/// Sample rate used when the document does not state one
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

/// 1-based channel position treated as LFE by [`LfeDetection::Positional`]
pub const LFE_CHANNEL_POSITION: usize = 4;

/// How a direct-speaker channel is recognised as the LFE channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LfeDetection {
    /// The 4th direct-speaker channel in document order (5.1/7.1 convention)
    #[default]
    Positional,
    /// Any channel whose speaker label or name contains "lfe" (case-insensitive)
    Label,
}

impl LfeDetection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positional => "positional",
            Self::Label => "label",
        }
    }

    /// `index` is the 0-based position among direct-speaker records
    pub fn is_lfe(&self, index: usize, speaker: &DirectSpeakerRecord) -> bool {
        match self {
            Self::Positional => index + 1 == LFE_CHANNEL_POSITION,
            Self::Label => {
                speaker.speaker_label.to_lowercase().contains("lfe")
                    || speaker.name.to_lowercase().contains("lfe")
            }
        }
    }
}

impl fmt::Display for LfeDetection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LfeDetection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positional" => Ok(Self::Positional),
            "label" => Ok(Self::Label),
            other => Err(format!("unknown LFE detection '{other}' (expected positional or label)")),
        }
    }
}

/// Scene builder options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildOptions {
    /// LFE detection strategy
    #[serde(default)]
    pub lfe_detection: LfeDetection,

    /// Sample rate used when the document has no valid `SampleRate`
    #[serde(default = "default_sample_rate")]
    pub default_sample_rate: u32,
}

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            lfe_detection: LfeDetection::default(),
            default_sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

impl BuildOptions {
    pub fn with_lfe_detection(mut self, lfe_detection: LfeDetection) -> Self {
        self.lfe_detection = lfe_detection;
        self
    }
}

/// Build a scene from extracted records.
///
/// Static nodes (direct speakers, LFE) go into the frame at t=0; each object
/// block becomes an `audio_object` node in the frame at its `rtime`.
pub fn build_scene(
    extraction: &AdmExtraction,
    activity: Option<&ChannelActivity>,
    options: &BuildOptions,
) -> Parsed<Scene> {
    let mut diags = Diagnostics::new();
    let is_active = |channel: usize| activity.is_none_or(|a| a.is_active(channel));

    let sample_rate = sample_rate(extraction, options, &mut diags);

    if !extraction.root_found {
        diags.warn(STAGE, "no ADM content located, returning empty scene");
        let scene = Scene::default().with_sample_rate(Some(sample_rate));
        return Parsed::new(scene, diags);
    }

    // Microsecond key keeps frame times ordered and rounded to 6 decimals
    let mut timeline: BTreeMap<i64, Vec<Node>> = BTreeMap::new();

    let speaker_count = extraction.direct_speakers.len();
    let mut static_nodes = Vec::with_capacity(speaker_count);
    for (index, speaker) in extraction.direct_speakers.iter().enumerate() {
        let id = NodeId::new(group_number(index), 1);
        if !is_active(index) {
            log::debug!("Skipping silent direct speaker '{}' ({id})", speaker.name);
            continue;
        }

        if options.lfe_detection.is_lfe(index, speaker) {
            static_nodes.push(Node::lfe(id));
        } else {
            static_nodes.push(Node::direct_speaker(
                id,
                speaker.position,
                speaker.speaker_label.clone(),
                speaker.channel_id.clone(),
            ));
        }
    }
    timeline.insert(0, static_nodes);

    for (ordinal, object) in extraction.objects.iter().enumerate() {
        let channel = speaker_count + ordinal;
        let id = NodeId::new(group_number(channel), 1);
        if !is_active(channel) {
            log::debug!("Skipping silent object '{}' ({id})", object.name);
            continue;
        }

        for block in &object.blocks {
            let seconds = parse_timecode(&block.rtime).unwrap_or_else(|e| {
                diags.warn(
                    STAGE,
                    format!("object '{}': {e}, defaulting to 0.0", object.name),
                );
                0.0
            });

            let nodes = timeline.entry(time_key(seconds)).or_default();
            if let Some(index) = nodes.iter().position(|n| n.id() == id) {
                diags.warn(
                    STAGE,
                    format!(
                        "object '{}' has several blocks at t={seconds}, keeping the last",
                        object.name
                    ),
                );
                nodes.remove(index);
            }
            nodes.push(Node::audio_object(id, block.position));
        }
    }

    let frames: Vec<Frame> = timeline
        .into_iter()
        .filter(|(_, nodes)| !nodes.is_empty())
        .map(|(key, nodes)| Frame::new(key as f64 / 1e6, nodes))
        .collect();

    let (explicit_duration, metadata) = metadata(extraction, &mut diags);

    let scene = Scene::new(frames)
        .with_time_unit(TimeUnit::Seconds)
        .with_sample_rate(Some(sample_rate))
        .with_metadata(metadata)
        .with_explicit_duration(explicit_duration);

    log::debug!(
        "Built scene: {} direct speakers, {} objects, {} frames",
        speaker_count,
        extraction.objects.len(),
        scene.frame_count()
    );

    Parsed::new(scene, diags)
}

/// Parse ADM XML text and build a scene.
///
/// # Errors
///
/// Only when the text is not well-formed XML; everything else degrades into
/// diagnostics.
pub fn adm_str_to_scene(
    text: &str,
    activity: Option<&ChannelActivity>,
    options: &BuildOptions,
) -> AdmResult<Parsed<Scene>> {
    let doc = AdmDocument::parse(text)?;
    let (extraction, mut diags) = extract(&doc).into_parts();
    let (scene, build_diags) = build_scene(&extraction, activity, options).into_parts();
    diags.extend(build_diags);
    Ok(Parsed::new(scene, diags))
}

/// Read an ADM XML file and build a scene
pub fn adm_file_to_scene(
    path: impl AsRef<Path>,
    activity: Option<&ChannelActivity>,
    options: &BuildOptions,
) -> AdmResult<Parsed<Scene>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(AdmError::NotFound(path.to_path_buf()));
    }
    log::debug!("Reading ADM XML: {}", path.display());
    let text = fs::read_to_string(path)?;
    adm_str_to_scene(&text, activity, options)
}

/// Group for the 0-based channel index (groups start at 1)
fn group_number(channel: usize) -> u32 {
    u32::try_from(channel + 1).unwrap_or(u32::MAX)
}

fn time_key(seconds: f64) -> i64 {
    (seconds * 1e6).round() as i64
}

fn sample_rate(extraction: &AdmExtraction, options: &BuildOptions, diags: &mut Diagnostics) -> u32 {
    let Some(raw) = extraction.global.get("SampleRate") else {
        return options.default_sample_rate;
    };
    match raw.trim().parse::<u32>() {
        Ok(rate) if rate > 0 => rate,
        _ => {
            diags.warn(
                STAGE,
                format!(
                    "invalid SampleRate '{raw}', using {}",
                    options.default_sample_rate
                ),
            );
            options.default_sample_rate
        }
    }
}

/// Explicit duration (seconds) and scene metadata from the global record
fn metadata(extraction: &AdmExtraction, diags: &mut Diagnostics) -> (Option<f64>, Map<String, Value>) {
    let mut metadata = Map::new();
    metadata.insert("sourceFormat".into(), Value::from("ADM"));

    let mut explicit_duration = None;
    if let Some(duration) = extraction.global.get("Duration").filter(|d| !d.is_empty()) {
        match parse_timecode(duration) {
            Ok(seconds) => explicit_duration = Some(seconds),
            Err(e) => diags.warn(STAGE, format!("Duration: {e}, leaving scene duration unset")),
        }
        metadata.insert("duration".into(), Value::from(duration.as_str()));
    }

    if let Some(format) = extraction.global.get("Format").filter(|f| !f.is_empty()) {
        metadata.insert("format".into(), Value::from(format.as_str()));
    }

    (explicit_duration, metadata)
}
