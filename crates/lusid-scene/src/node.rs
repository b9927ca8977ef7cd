//! Node — the five kinds of scene-graph entries
//!
//! Every node carries a `"<group>.<hierarchy>"` identifier. The group is
//! assigned once when a scene is built from ADM and is never recomputed.

use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Cartesian position `[x, y, z]`
pub type Cart = [f64; 3];

/// Opaque key/value payload carried by analysis and agent nodes
pub type Payload = Map<String, Value>;

/// Parsed node identifier `"<group>.<hierarchy>"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub group: u32,
    pub hierarchy: u32,
}

impl NodeId {
    pub fn new(group: u32, hierarchy: u32) -> Self {
        Self { group, hierarchy }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.group, self.hierarchy)
    }
}

/// Rejected node identifier text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidNodeId(pub String);

impl fmt::Display for InvalidNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "node id '{}' does not match 'X.Y' where X and Y are integers",
            self.0
        )
    }
}

impl std::error::Error for InvalidNodeId {}

impl FromStr for NodeId {
    type Err = InvalidNodeId;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidNodeId(raw.to_string());
        let (group, hierarchy) = raw.split_once('.').ok_or_else(invalid)?;
        if !is_decimal(group) || !is_decimal(hierarchy) {
            return Err(invalid());
        }
        Ok(Self {
            group: group.parse().map_err(|_| invalid())?,
            hierarchy: hierarchy.parse().map_err(|_| invalid())?,
        })
    }
}

fn is_decimal(part: &str) -> bool {
    !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit())
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Node type discriminator (`type` field)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    AudioObject,
    DirectSpeaker,
    Lfe,
    SpectralFeatures,
    AgentState,
}

impl NodeKind {
    pub const ALL: [NodeKind; 5] = [
        NodeKind::AudioObject,
        NodeKind::DirectSpeaker,
        NodeKind::Lfe,
        NodeKind::SpectralFeatures,
        NodeKind::AgentState,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AudioObject => "audio_object",
            Self::DirectSpeaker => "direct_speaker",
            Self::Lfe => "LFE",
            Self::SpectralFeatures => "spectral_features",
            Self::AgentState => "agent_state",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = String;

    /// Exact match only; `type` values are case-sensitive
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == raw)
            .ok_or_else(|| raw.to_string())
    }
}

/// A scene-graph node
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Moving, spatialized source
    AudioObject { id: NodeId, cart: Cart, gain: f64 },

    /// Fixed bed channel with a single static position
    DirectSpeaker {
        id: NodeId,
        cart: Cart,
        speaker_label: String,
        channel_id: String,
    },

    /// Low-frequency effects channel, routed to subwoofers, never spatialized
    Lfe { id: NodeId },

    /// Per-group, per-time analysis data
    SpectralFeatures { id: NodeId, data: Payload },

    /// Per-group, per-time AI/agent metadata
    AgentState { id: NodeId, data: Payload },
}

impl Node {
    /// Audio object with unity gain
    pub fn audio_object(id: NodeId, cart: Cart) -> Self {
        Self::AudioObject { id, cart, gain: 1.0 }
    }

    pub fn direct_speaker(
        id: NodeId,
        cart: Cart,
        speaker_label: impl Into<String>,
        channel_id: impl Into<String>,
    ) -> Self {
        Self::DirectSpeaker {
            id,
            cart,
            speaker_label: speaker_label.into(),
            channel_id: channel_id.into(),
        }
    }

    pub fn lfe(id: NodeId) -> Self {
        Self::Lfe { id }
    }

    pub fn id(&self) -> NodeId {
        match self {
            Self::AudioObject { id, .. }
            | Self::DirectSpeaker { id, .. }
            | Self::Lfe { id }
            | Self::SpectralFeatures { id, .. }
            | Self::AgentState { id, .. } => *id,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Self::AudioObject { .. } => NodeKind::AudioObject,
            Self::DirectSpeaker { .. } => NodeKind::DirectSpeaker,
            Self::Lfe { .. } => NodeKind::Lfe,
            Self::SpectralFeatures { .. } => NodeKind::SpectralFeatures,
            Self::AgentState { .. } => NodeKind::AgentState,
        }
    }

    /// Group number (X in X.Y)
    pub fn group(&self) -> u32 {
        self.id().group
    }

    /// Hierarchy level (Y in X.Y)
    pub fn hierarchy(&self) -> u32 {
        self.id().hierarchy
    }

    /// Spatial payload, if this kind has one
    pub fn cart(&self) -> Option<&Cart> {
        match self {
            Self::AudioObject { cart, .. } | Self::DirectSpeaker { cart, .. } => Some(cart),
            _ => None,
        }
    }

    /// Opaque payload, if this kind has one
    pub fn payload(&self) -> Option<&Payload> {
        match self {
            Self::SpectralFeatures { data, .. } | Self::AgentState { data, .. } => Some(data),
            _ => None,
        }
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("id", &self.id())?;
        map.serialize_entry("type", self.kind().as_str())?;

        match self {
            Self::AudioObject { cart, gain, .. } => {
                map.serialize_entry("cart", cart)?;
                if *gain != 1.0 {
                    map.serialize_entry("gain", gain)?;
                }
            }
            Self::DirectSpeaker {
                cart,
                speaker_label,
                channel_id,
                ..
            } => {
                map.serialize_entry("cart", cart)?;
                if !speaker_label.is_empty() {
                    map.serialize_entry("speakerLabel", speaker_label)?;
                }
                if !channel_id.is_empty() {
                    map.serialize_entry("channelID", channel_id)?;
                }
            }
            Self::Lfe { .. } => {}
            Self::SpectralFeatures { data, .. } | Self::AgentState { data, .. } => {
                for (key, value) in data {
                    if key != "id" && key != "type" {
                        map.serialize_entry(key, value)?;
                    }
                }
            }
        }

        map.end()
    }
}
