//! ADM extractor — element tree → ordered channel records
//!
//! Accepts either a bare `ebuCoreMain` document or a conformance-report
//! wrapper (`<Technical>` + `<aXML>` payload). Extraction never fails: a
//! missing root or section yields empty output plus a diagnostic.

use std::collections::BTreeMap;

use lusid_scene::{Cart, DiagnosticStage, Diagnostics, Parsed};
use serde::Serialize;

use crate::timecode::ZERO_TIMECODE;
use crate::xml::{AdmDocument, Element};

const STAGE: DiagnosticStage = DiagnosticStage::Extractor;

const ADM_ROOT: &str = "ebuCoreMain";
const AXML: &str = "aXML";
const TECHNICAL: &str = "Technical";
const CHANNEL_FORMAT: &str = "audioChannelFormat";
const BLOCK_FORMAT: &str = "audioBlockFormat";

/// Flat tag → text record from the `<Technical>` section
pub type GlobalData = BTreeMap<String, String>;

/// ADM channel type (`typeDefinition` attribute)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelType {
    DirectSpeakers,
    Objects,
}

impl ChannelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DirectSpeakers => "DirectSpeakers",
            Self::Objects => "Objects",
        }
    }
}

/// One `DirectSpeakers` channel: static position and label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectSpeakerRecord {
    pub name: String,
    pub channel_id: String,
    pub block_id: String,
    pub position: Cart,
    pub speaker_label: String,
    pub cartesian: i32,
}

/// One timed position block of an `Objects` channel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionBlock {
    pub block_id: String,
    /// Start time relative to the programme, `HH:MM:SS.fffff`
    pub rtime: String,
    pub duration: String,
    pub position: Cart,
    pub cartesian: Option<i32>,
    pub width: Option<f64>,
    pub depth: Option<f64>,
    pub height: Option<f64>,
}

/// One `Objects` channel with its blocks in document order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectRecord {
    pub name: String,
    pub channel_id: String,
    pub blocks: Vec<PositionBlock>,
}

/// Everything the scene builder needs from an ADM document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdmExtraction {
    pub global: GlobalData,
    pub direct_speakers: Vec<DirectSpeakerRecord>,
    pub objects: Vec<ObjectRecord>,
    /// False when no `ebuCoreMain` element could be located
    pub root_found: bool,
}

impl AdmExtraction {
    /// Total channel count (direct speakers followed by objects)
    pub fn channel_count(&self) -> usize {
        self.direct_speakers.len() + self.objects.len()
    }
}

/// Extract global data, direct-speaker channels and object channels
pub fn extract(doc: &AdmDocument) -> Parsed<AdmExtraction> {
    let mut diags = Diagnostics::new();

    let global = extract_global_data(doc, &mut diags);

    let Some(adm_root) = find_adm_root(doc.root()) else {
        diags.warn(STAGE, "could not find ebuCoreMain element in XML");
        return Parsed::new(
            AdmExtraction {
                global,
                ..Default::default()
            },
            diags,
        );
    };

    let direct_speakers = extract_direct_speakers(adm_root, &mut diags);
    let objects = extract_objects(adm_root, &mut diags);

    log::debug!(
        "ADM extraction: {} direct speakers, {} objects, {} global fields",
        direct_speakers.len(),
        objects.len(),
        global.len()
    );

    Parsed::new(
        AdmExtraction {
            global,
            direct_speakers,
            objects,
            root_found: true,
        },
        diags,
    )
}

/// Locate the ADM root: the document root itself, then an `aXML` payload's
/// direct child, then anywhere in the document
pub fn find_adm_root(root: &Element) -> Option<&Element> {
    if root.name() == ADM_ROOT {
        return Some(root);
    }
    if let Some(adm) = root.find(AXML).and_then(|axml| axml.child(ADM_ROOT)) {
        return Some(adm);
    }
    root.find(ADM_ROOT)
}

/// Tag → text for every child of the first `<Technical>` element
pub fn extract_global_data(doc: &AdmDocument, diags: &mut Diagnostics) -> GlobalData {
    let root = doc.root();
    let technical = if root.name() == TECHNICAL {
        Some(root)
    } else {
        root.find(TECHNICAL)
    };

    let Some(technical) = technical else {
        diags.warn(STAGE, "no <Technical> section found in XML");
        return GlobalData::new();
    };

    technical
        .children()
        .iter()
        .map(|e| (e.name().trim().to_string(), e.text().to_string()))
        .collect()
}

/// Channel elements with the given `typeDefinition`, in document order
fn channels_of_type(
    adm_root: &Element,
    channel_type: ChannelType,
) -> impl Iterator<Item = &Element> {
    adm_root
        .descendants()
        .filter(|e| e.name() == CHANNEL_FORMAT)
        .filter(move |e| e.attr("typeDefinition") == Some(channel_type.as_str()))
}

fn channel_name(channel: &Element) -> String {
    channel
        .attr("audioChannelFormatName")
        .unwrap_or("Unnamed")
        .to_string()
}

fn channel_id(channel: &Element) -> String {
    channel
        .attr("audioChannelFormatID")
        .unwrap_or_default()
        .to_string()
}

fn extract_direct_speakers(adm_root: &Element, diags: &mut Diagnostics) -> Vec<DirectSpeakerRecord> {
    let mut speakers = Vec::new();

    for channel in channels_of_type(adm_root, ChannelType::DirectSpeakers) {
        let name = channel_name(channel);
        let Some(block) = channel.child(BLOCK_FORMAT) else {
            diags.warn(
                STAGE,
                format!("DirectSpeakers channel '{name}' has no audioBlockFormat, skipping"),
            );
            continue;
        };

        let speaker_label = block
            .child("speakerLabel")
            .map(|e| e.text().to_string())
            .unwrap_or_default();

        speakers.push(DirectSpeakerRecord {
            channel_id: channel_id(channel),
            block_id: block.attr("audioBlockFormatID").unwrap_or_default().to_string(),
            position: position_coords(block, &name, diags),
            speaker_label,
            cartesian: cartesian_flag(block, &name, diags).unwrap_or(1),
            name,
        });
    }

    speakers
}

fn extract_objects(adm_root: &Element, diags: &mut Diagnostics) -> Vec<ObjectRecord> {
    let mut objects = Vec::new();

    for channel in channels_of_type(adm_root, ChannelType::Objects) {
        let name = channel_name(channel);

        let blocks: Vec<PositionBlock> = channel
            .children_named(BLOCK_FORMAT)
            .map(|block| PositionBlock {
                block_id: block.attr("audioBlockFormatID").unwrap_or_default().to_string(),
                rtime: block.attr("rtime").unwrap_or(ZERO_TIMECODE).to_string(),
                duration: block.attr("duration").unwrap_or(ZERO_TIMECODE).to_string(),
                position: position_coords(block, &name, diags),
                cartesian: cartesian_flag(block, &name, diags),
                width: extent(block, "width", &name, diags),
                depth: extent(block, "depth", &name, diags),
                height: extent(block, "height", &name, diags),
            })
            .collect();

        if blocks.is_empty() {
            diags.warn(
                STAGE,
                format!("Objects channel '{name}' has no audioBlockFormat, skipping"),
            );
            continue;
        }

        objects.push(ObjectRecord {
            channel_id: channel_id(channel),
            name,
            blocks,
        });
    }

    objects
}

/// X/Y/Z from `<position coordinate="…">` children; missing axes are 0.0
fn position_coords(block: &Element, channel: &str, diags: &mut Diagnostics) -> Cart {
    let mut cart = [0.0; 3];

    for position in block.children_named("position") {
        let axis = match position.attr("coordinate") {
            Some("X") => 0,
            Some("Y") => 1,
            Some("Z") => 2,
            _ => continue,
        };
        let text = position.text();
        if text.is_empty() {
            continue;
        }
        match text.parse::<f64>() {
            Ok(value) if value.is_finite() => cart[axis] = value,
            _ => diags.warn(
                STAGE,
                format!("channel '{channel}': invalid position value '{text}', using 0.0"),
            ),
        }
    }

    cart
}

/// `<cartesian>` flag: `None` when absent, 1 when empty or unparsable
fn cartesian_flag(block: &Element, channel: &str, diags: &mut Diagnostics) -> Option<i32> {
    let text = block.child("cartesian")?.text();
    if text.is_empty() {
        return Some(1);
    }
    Some(text.parse().unwrap_or_else(|_| {
        diags.warn(
            STAGE,
            format!("channel '{channel}': invalid cartesian flag '{text}', using 1"),
        );
        1
    }))
}

/// Optional `<width>`, `<depth>` or `<height>` value
fn extent(block: &Element, tag: &str, channel: &str, diags: &mut Diagnostics) -> Option<f64> {
    let text = block.child(tag)?.text();
    if text.is_empty() {
        return None;
    }
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            diags.warn(
                STAGE,
                format!("channel '{channel}': invalid {tag} '{text}', ignoring"),
            );
            None
        }
    }
}
