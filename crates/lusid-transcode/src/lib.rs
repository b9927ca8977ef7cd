//! # lusid-transcode — LUSID scene → sonoPleth
//!
//! Projects a canonical scene into two outputs:
//!
//! - [`RenderInstructions`]: one keyframe track per `audio_object` group
//!   (`src_<group>`), times in seconds, plus a single `LFE` track when the
//!   scene has an LFE channel.
//! - [`MetadataSidecar`]: `spectral_features` and `agent_state` payloads
//!   bucketed by group and type.
//!
//! Frames whose time cannot be converted to seconds are skipped and
//! reported; nothing else in a structurally valid scene can fail.

pub mod render;
pub mod sidecar;

mod error;

pub use error::{TranscodeError, TranscodeResult};
pub use render::{
    DEFAULT_OUTPUT_SAMPLE_RATE, Keyframe, RenderInstructions, SourceKey, TranscodeOptions,
    transcode,
};
pub use sidecar::{GroupMetadata, MetadataSidecar, SidecarEntry, extract_metadata_sidecar};
