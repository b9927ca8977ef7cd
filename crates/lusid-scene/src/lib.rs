//! # lusid-scene — LUSID Scene v0.5
//!
//! Canonical, time-indexed spatial audio scene graph:
//!
//! ```text
//! Scene → Frame[] → Node[]
//! ```
//!
//! ## Node kinds
//! - `audio_object` — spatialized source with `cart` [x, y, z] and optional gain
//! - `direct_speaker` — fixed bed channel with a static position and label
//! - `LFE` — low-frequency effects, not spatialized
//! - `spectral_features` — analysis payload attached to a group
//! - `agent_state` — AI/agent payload attached to a group
//!
//! ## Loading
//! The [`loader`] turns arbitrary JSON into a well-formed [`Scene`],
//! dropping broken nodes/frames and reporting each drop as a
//! [`Diagnostic`]. Serialization is the structural inverse.

pub mod diagnostics;
pub mod frame;
pub mod loader;
pub mod node;
pub mod scene;
pub mod time;

mod error;

pub use diagnostics::{Diagnostic, DiagnosticStage, Diagnostics, Parsed, Severity};
pub use error::{SceneError, SceneResult};
pub use frame::Frame;
pub use loader::{DropReason, load_file, load_str, load_value};
pub use node::{Cart, Node, NodeId, NodeKind, Payload};
pub use scene::{SCHEMA_VERSION, Scene, SceneSummary, write_scene};
pub use time::{TimeUnit, round6, time_to_seconds};
