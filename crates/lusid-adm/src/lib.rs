//! # lusid-adm — ADM XML → LUSID scene
//!
//! Two stages:
//!
//! 1. **Extraction** ([`extract`]): locate the `ebuCoreMain` root (bare, or
//!    wrapped in a conformance report's `<aXML>` payload), read the
//!    `<Technical>` global record, and collect `DirectSpeakers` and `Objects`
//!    channels in document order.
//! 2. **Building** ([`build_scene`]): assign groups (direct speakers 1..=N,
//!    objects N+1..), classify the LFE channel with an explicit
//!    [`LfeDetection`] strategy, and merge static and timed nodes into frames.
//!
//! ```text
//! XML text → AdmDocument → AdmExtraction → Scene
//! ```
//!
//! Only malformed XML (or a missing file) is an error. Everything else is
//! reported through [`lusid_scene::Diagnostics`].

pub mod activity;
pub mod build;
pub mod extract;
pub mod timecode;
pub mod xml;

mod error;

pub use activity::ChannelActivity;
pub use build::{
    BuildOptions, DEFAULT_SAMPLE_RATE, LfeDetection, adm_file_to_scene, adm_str_to_scene,
    build_scene,
};
pub use error::{AdmError, AdmResult};
pub use extract::{
    AdmExtraction, ChannelType, DirectSpeakerRecord, GlobalData, ObjectRecord, PositionBlock,
    extract,
};
pub use timecode::parse_timecode;
pub use xml::{AdmDocument, Element};
