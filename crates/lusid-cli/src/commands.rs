//! Command implementations — file I/O around the library crates

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lusid_adm::{BuildOptions, ChannelActivity, adm_file_to_scene};
use lusid_scene::{Diagnostics, Scene, load_file, write_scene};
use lusid_transcode::{TranscodeOptions, extract_metadata_sidecar, transcode};

/// File names written by `pipeline`
pub const SCENE_FILE: &str = "scene.lusid.json";
pub const RENDER_FILE: &str = "renderInstructions.json";
pub const SIDECAR_FILE: &str = "scene_metadata.json";

/// Paths produced by a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutputs {
    pub scene: PathBuf,
    pub render: PathBuf,
    pub sidecar: Option<PathBuf>,
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    Ok(())
}

fn report_diagnostics(what: &str, diagnostics: &Diagnostics) {
    if !diagnostics.is_empty() {
        log::info!(
            "{what}: {} diagnostics ({} warnings)",
            diagnostics.len(),
            diagnostics.warning_count()
        );
    }
}

fn load_activity(path: Option<&Path>) -> Result<Option<ChannelActivity>> {
    path.map(|p| {
        ChannelActivity::from_file(p)
            .with_context(|| format!("Failed to read channel activity {}", p.display()))
    })
    .transpose()
}

/// ADM XML → LUSID scene file
pub fn adm_to_scene(
    input: &Path,
    output: &Path,
    activity: Option<&Path>,
    options: &BuildOptions,
    pretty: bool,
) -> Result<Scene> {
    let activity = load_activity(activity)?;
    let (scene, diagnostics) = adm_file_to_scene(input, activity.as_ref(), options)
        .with_context(|| format!("Failed to import ADM {}", input.display()))?
        .into_parts();
    report_diagnostics("ADM import", &diagnostics);

    ensure_parent(output)?;
    write_scene(&scene, output, pretty)
        .with_context(|| format!("Failed to write scene {}", output.display()))?;

    println!("✓ Wrote LUSID scene: {}", output.display());
    println!(
        "  {} direct_speaker, {} audio_object, LFE={}, sampleRate={}, {} frames",
        scene.direct_speaker_groups().len(),
        scene.audio_object_groups().len(),
        if scene.has_lfe() { "yes" } else { "no" },
        scene.sample_rate().unwrap_or_default(),
        scene.frame_count()
    );

    Ok(scene)
}

/// Scene → render instructions (+ optional sidecar)
pub fn scene_to_render(
    scene: &Scene,
    output: &Path,
    sidecar: Option<&Path>,
    options: &TranscodeOptions,
    pretty: bool,
) -> Result<()> {
    let (render, diagnostics) = transcode(scene, options).into_parts();
    report_diagnostics("Transcode", &diagnostics);

    ensure_parent(output)?;
    render
        .write(output, pretty)
        .with_context(|| format!("Failed to write render instructions {}", output.display()))?;

    println!("✓ Wrote renderInstructions: {}", output.display());
    println!(
        "  {} audio sources, LFE={}, sampleRate={}",
        render.source_count(),
        if render.has_lfe() { "yes" } else { "no" },
        render.sample_rate
    );

    if let Some(path) = sidecar {
        let (metadata, diagnostics) = extract_metadata_sidecar(scene).into_parts();
        report_diagnostics("Sidecar", &diagnostics);

        ensure_parent(path)?;
        metadata
            .write(path, pretty)
            .with_context(|| format!("Failed to write metadata sidecar {}", path.display()))?;
        println!(
            "✓ Wrote metadata sidecar: {} ({} groups)",
            path.display(),
            metadata.group_count()
        );
    }

    Ok(())
}

/// Scene file → render instructions (+ optional sidecar)
pub fn transcode_file(
    input: &Path,
    output: &Path,
    sidecar: Option<&Path>,
    options: &TranscodeOptions,
    pretty: bool,
) -> Result<()> {
    let (scene, diagnostics) = load_file(input)
        .with_context(|| format!("Failed to load scene {}", input.display()))?
        .into_parts();
    report_diagnostics("Scene load", &diagnostics);
    scene_to_render(&scene, output, sidecar, options, pretty)
}

/// Summary and diagnostics of a scene file
pub fn inspect(input: &Path) -> Result<String> {
    let (scene, diagnostics) = load_file(input)
        .with_context(|| format!("Failed to load scene {}", input.display()))?
        .into_parts();

    let mut report = scene.summary().to_string();
    if let Some(seconds) = scene.explicit_duration() {
        writeln!(report, "  Explicit Duration: {seconds:.3} s")?;
    }
    if diagnostics.is_empty() {
        writeln!(report, "  No diagnostics")?;
    } else {
        writeln!(report, "  Diagnostics ({}):", diagnostics.len())?;
        for diagnostic in &diagnostics {
            writeln!(report, "    {diagnostic}")?;
        }
    }
    Ok(report)
}

/// ADM XML → scene → render instructions (+ sidecar) in one directory
pub fn pipeline(
    input: &Path,
    out_dir: &Path,
    activity: Option<&Path>,
    build_options: &BuildOptions,
    transcode_options: &TranscodeOptions,
    write_sidecar: bool,
    pretty: bool,
) -> Result<PipelineOutputs> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create directory {}", out_dir.display()))?;

    let outputs = PipelineOutputs {
        scene: out_dir.join(SCENE_FILE),
        render: out_dir.join(RENDER_FILE),
        sidecar: write_sidecar.then(|| out_dir.join(SIDECAR_FILE)),
    };

    let scene = adm_to_scene(input, &outputs.scene, activity, build_options, pretty)?;
    scene_to_render(
        &scene,
        &outputs.render,
        outputs.sidecar.as_deref(),
        transcode_options,
        pretty,
    )?;

    Ok(outputs)
}
