//! Per-channel audio activity ("contains audio") map

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::{AdmError, AdmResult};

/// 0-based channel index → whether the channel carries audio.
///
/// Channels without an entry are active.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelActivity {
    channels: HashMap<usize, bool>,
}

impl ChannelActivity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, channel: usize, active: bool) {
        self.channels.insert(channel, active);
    }

    pub fn with(mut self, channel: usize, active: bool) -> Self {
        self.set(channel, active);
        self
    }

    pub fn is_active(&self, channel: usize) -> bool {
        self.channels.get(&channel).copied().unwrap_or(true)
    }

    /// Number of channels explicitly marked silent
    pub fn silent_count(&self) -> usize {
        self.channels.values().filter(|active| !**active).count()
    }

    /// Read the channel-analysis report shape
    /// `{"channels": [{"channel_index": 0, "contains_audio": true}, …]}`.
    ///
    /// Entries without a usable `channel_index` are ignored; entries without
    /// `contains_audio` count as silent.
    pub fn from_json(raw: &Value) -> Self {
        let mut activity = Self::new();
        let entries = raw
            .get("channels")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for entry in entries {
            let Some(index) = entry.get("channel_index").and_then(Value::as_u64) else {
                continue;
            };
            let active = entry
                .get("contains_audio")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            activity.set(index as usize, active);
        }

        activity
    }

    /// Load a channel-analysis report from disk
    pub fn from_file(path: impl AsRef<Path>) -> AdmResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AdmError::NotFound(path.to_path_buf()));
        }
        let raw: Value = serde_json::from_str(&fs::read_to_string(path)?)?;
        Ok(Self::from_json(&raw))
    }
}

impl FromIterator<(usize, bool)> for ChannelActivity {
    fn from_iter<I: IntoIterator<Item = (usize, bool)>>(iter: I) -> Self {
        Self {
            channels: iter.into_iter().collect(),
        }
    }
}
