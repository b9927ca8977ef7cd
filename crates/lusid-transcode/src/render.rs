//! Render instructions — per-source keyframe tracks for the sonoPleth renderer
//!
//! ```text
//! {
//!   "sampleRate": 48000,
//!   "timeUnit": "seconds",
//!   "sources": {
//!     "src_<group>": [ {"time": t, "cart": [x, y, z]}, … ],
//!     "LFE":         [ {"time": 0.0} ]
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use lusid_scene::{Cart, DiagnosticStage, Diagnostics, Frame, Node, Parsed, Scene, TimeUnit, round6};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::TranscodeResult;

const STAGE: DiagnosticStage = DiagnosticStage::Transcoder;

/// Sample rate written when the scene has none
pub const DEFAULT_OUTPUT_SAMPLE_RATE: u32 = 48000;

/// Transcoder options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeOptions {
    /// Output sample rate, used only when the scene does not carry one
    #[serde(default = "default_output_sample_rate")]
    pub output_sample_rate: u32,
}

fn default_output_sample_rate() -> u32 {
    DEFAULT_OUTPUT_SAMPLE_RATE
}

impl Default for TranscodeOptions {
    fn default() -> Self {
        Self {
            output_sample_rate: DEFAULT_OUTPUT_SAMPLE_RATE,
        }
    }
}

/// Track name in the `sources` map.
///
/// Ordered by group number, with the LFE track last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKey {
    Group(u32),
    Lfe,
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group(group) => write!(f, "src_{group}"),
            Self::Lfe => f.write_str("LFE"),
        }
    }
}

impl Serialize for SourceKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One point on a source track
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Keyframe {
    /// Seconds, rounded to 6 decimals
    pub time: f64,

    /// Position, rounded to 6 decimals; absent on the LFE track
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cart: Option<Cart>,
}

impl Keyframe {
    pub fn positioned(time: f64, cart: &Cart) -> Self {
        Self {
            time: round6(time),
            cart: Some(cart.map(round6)),
        }
    }

    /// The single keyframe of the LFE track
    pub fn lfe() -> Self {
        Self {
            time: 0.0,
            cart: None,
        }
    }
}

/// Renderer-ready scene
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderInstructions {
    #[serde(rename = "sampleRate")]
    pub sample_rate: u32,

    #[serde(rename = "timeUnit")]
    pub time_unit: TimeUnit,

    pub sources: BTreeMap<SourceKey, Vec<Keyframe>>,
}

impl RenderInstructions {
    /// Number of spatial source tracks (LFE excluded)
    pub fn source_count(&self) -> usize {
        self.sources
            .keys()
            .filter(|key| matches!(key, SourceKey::Group(_)))
            .count()
    }

    pub fn has_lfe(&self) -> bool {
        self.sources.contains_key(&SourceKey::Lfe)
    }

    /// Keyframes of `src_<group>`
    pub fn track(&self, group: u32) -> Option<&[Keyframe]> {
        self.sources.get(&SourceKey::Group(group)).map(Vec::as_slice)
    }

    pub fn lfe_track(&self) -> Option<&[Keyframe]> {
        self.sources.get(&SourceKey::Lfe).map(Vec::as_slice)
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
        log::debug!("Wrote render instructions: {}", path.as_ref().display());
        Ok(())
    }
}

/// Frames paired with their time in seconds. Frames whose time cannot be
/// converted are left out and reported.
pub(crate) fn frames_in_seconds<'a>(scene: &'a Scene, diags: &mut Diagnostics) -> Vec<(f64, &'a Frame)> {
    scene
        .frames()
        .iter()
        .filter_map(|frame| {
            match scene.time_unit().to_seconds(frame.time(), scene.sample_rate()) {
                Ok(seconds) => Some((seconds, frame)),
                Err(e) => {
                    diags.warn(STAGE, format!("{e}, skipping frame"));
                    None
                }
            }
        })
        .collect()
}

/// Flatten a scene into per-source keyframe tracks.
///
/// Every `audio_object` contributes one keyframe to `src_<group>`, in frame
/// order. Any `LFE` node anywhere adds a single `LFE` track at t=0. Analysis
/// and agent nodes are not part of the render output.
pub fn transcode(scene: &Scene, options: &TranscodeOptions) -> Parsed<RenderInstructions> {
    let mut diags = Diagnostics::new();
    let mut sources: BTreeMap<SourceKey, Vec<Keyframe>> = BTreeMap::new();
    let mut has_lfe = false;

    for (seconds, frame) in frames_in_seconds(scene, &mut diags) {
        for node in frame.nodes() {
            match node {
                Node::AudioObject { id, cart, .. } => sources
                    .entry(SourceKey::Group(id.group))
                    .or_default()
                    .push(Keyframe::positioned(seconds, cart)),
                Node::Lfe { .. } => has_lfe = true,
                _ => {}
            }
        }
    }

    if has_lfe {
        sources.insert(SourceKey::Lfe, vec![Keyframe::lfe()]);
    }

    let render = RenderInstructions {
        sample_rate: scene.sample_rate().unwrap_or(options.output_sample_rate),
        time_unit: TimeUnit::Seconds,
        sources,
    };

    log::debug!(
        "Transcoded scene: {} sources, LFE={}",
        render.source_count(),
        render.has_lfe()
    );

    Parsed::new(render, diags)
}
