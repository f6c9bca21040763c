//! Shader export and logging for graph assets.
//!
//! The generator and the save dialog are collaborators behind
//! [`ShaderTextSource`] and [`SavePathPrompt`]. An absent or empty path from
//! the prompt is a cancellation, never an error.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use crate::dsl::load_graph_from_path;
use crate::preamble::build_shader_preamble;

pub const SHADER_EXTENSION: &str = "shader";
pub const GRAPH_EXTENSION: &str = "shadergraph";
pub const SUBGRAPH_EXTENSION: &str = "shadersubgraph";

/// Directory used when nothing better is known.
pub const DEFAULT_EXPORT_DIR: &str = "Assets";

/// Produces shader source for a graph asset.
pub trait ShaderTextSource {
    fn shader_text(&self, asset_path: &Path) -> Result<String>;
}

/// What the save prompt is asked to show.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveRequest {
    pub title: String,
    pub directory: PathBuf,
    pub file_name: String,
    pub extension: String,
}

/// Asks the user where to save. `None` or an empty path cancels.
pub trait SavePathPrompt {
    fn prompt(&mut self, request: &SaveRequest) -> Option<PathBuf>;
}

impl<F> SavePathPrompt for F
where
    F: FnMut(&SaveRequest) -> Option<PathBuf>,
{
    fn prompt(&mut self, request: &SaveRequest) -> Option<PathBuf> {
        (*self)(request)
    }
}

/// Context for choosing the suggested save location.
#[derive(Clone, Debug, Default)]
pub struct ExportHint {
    /// Preferred output path; only used if it already has the shader extension.
    pub recommended_path: Option<PathBuf>,
    /// Path of the scene open in the host, if any.
    pub active_scene: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExportOutcome {
    Written(PathBuf),
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphAssetKind {
    Graph,
    SubGraph,
}

/// Classify a path by extension, ignoring case.
pub fn graph_asset_kind(path: &Path) -> Option<GraphAssetKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        GRAPH_EXTENSION => Some(GraphAssetKind::Graph),
        SUBGRAPH_EXTENSION => Some(GraphAssetKind::SubGraph),
        _ => None,
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(ext)
}

fn non_empty(path: &Option<PathBuf>) -> Option<&Path> {
    path.as_deref().filter(|p| !p.as_os_str().is_empty())
}

/// Directory the save prompt opens in.
///
/// A recommended path with the right extension wins (its directory is
/// created if missing). Otherwise the active scene's directory, otherwise
/// [`DEFAULT_EXPORT_DIR`].
pub fn suggested_directory(hint: &ExportHint, ext: &str) -> Result<PathBuf> {
    if let Some(recommended) = non_empty(&hint.recommended_path)
        && has_extension(recommended, ext)
    {
        let dir = recommended
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new(DEFAULT_EXPORT_DIR));
        if !dir.exists() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create export directory {}", dir.display()))?;
        }
        return Ok(dir.to_path_buf());
    }

    let scene_dir = non_empty(&hint.active_scene)
        .and_then(Path::parent)
        .filter(|p| !p.as_os_str().is_empty());
    Ok(scene_dir.map_or_else(|| PathBuf::from(DEFAULT_EXPORT_DIR), Path::to_path_buf))
}

/// First of `stem.ext`, `stem 1.ext`, `stem 2.ext`, ... not present in `dir`.
pub fn unique_file_name(dir: &Path, stem: &str, ext: &str) -> String {
    let first = format!("{stem}.{ext}");
    if !dir.join(&first).exists() {
        return first;
    }
    (1u32..)
        .map(|n| format!("{stem} {n}.{ext}"))
        .find(|name| !dir.join(name).exists())
        .unwrap_or(first)
}

/// Generate shader text for `asset_path` and write it where the user chooses.
pub fn export_shader(
    source: &dyn ShaderTextSource,
    asset_path: &Path,
    prompt: &mut dyn SavePathPrompt,
    hint: &ExportHint,
) -> Result<ExportOutcome> {
    info!("exporting shader for {}", asset_path.display());
    let text = source
        .shader_text(asset_path)
        .with_context(|| format!("failed to generate shader for {}", asset_path.display()))?;

    let directory = suggested_directory(hint, SHADER_EXTENSION)?;
    let stem = asset_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Shader");
    let request = SaveRequest {
        title: "Save Shader".to_string(),
        file_name: unique_file_name(&directory, stem, SHADER_EXTENSION),
        directory,
        extension: SHADER_EXTENSION.to_string(),
    };

    let Some(path) = prompt.prompt(&request).filter(|p| !p.as_os_str().is_empty()) else {
        info!("shader export cancelled");
        return Ok(ExportOutcome::Cancelled);
    };

    std::fs::write(&path, text.as_bytes())
        .with_context(|| format!("failed to write shader to {}", path.display()))?;
    info!("wrote {} bytes to {}", text.len(), path.display());
    Ok(ExportOutcome::Written(path))
}

/// Log the asset path and its generated shader text.
pub fn log_shader(source: &dyn ShaderTextSource, asset_path: &Path) -> Result<String> {
    info!("{}", asset_path.display());
    let text = source
        .shader_text(asset_path)
        .with_context(|| format!("failed to generate shader for {}", asset_path.display()))?;
    info!("{text}");
    Ok(text)
}

/// Reads a graph document and emits its pass preamble.
#[derive(Clone, Debug, Default)]
pub struct PreambleSource {
    /// Overrides the graph's own name in the `Shader` block.
    pub shader_name: Option<String>,
}

impl ShaderTextSource for PreambleSource {
    fn shader_text(&self, asset_path: &Path) -> Result<String> {
        let graph = load_graph_from_path(asset_path)?;
        let name = self.shader_name.as_deref().unwrap_or(graph.name());
        build_shader_preamble(&graph, name)
    }
}

/// Native save dialog.
#[cfg(feature = "native-dialog")]
#[derive(Clone, Copy, Debug, Default)]
pub struct RfdSavePrompt;

#[cfg(feature = "native-dialog")]
impl SavePathPrompt for RfdSavePrompt {
    fn prompt(&mut self, request: &SaveRequest) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .set_title(request.title.as_str())
            .set_directory(&request.directory)
            .set_file_name(request.file_name.as_str())
            .add_filter("Shader", &[request.extension.as_str()])
            .save_file()
    }
}
