//! Reading inputs and writing output triples
//!
//! For an input `smlouva.txt` the writer produces `smlouva_anon.txt`,
//! `smlouva_map.json` and `smlouva_map.txt`. Files are first written with a
//! `.partial` extension and renamed into place only when all of them were
//! written, so a failed document leaves no output behind.

use crate::anonymization::models::AnonymizedDocument;
use crate::config::OutputConfig;
use crate::core::summary::DocumentOutputs;
use crate::domain::{RedaktError, Result};
use std::fs;
use std::path::{Path, PathBuf};

const PARTIAL_EXTENSION: &str = "partial";

/// Read a UTF-8 input document, dropping a leading byte-order mark
pub fn read_document(path: &Path) -> Result<String> {
    let bytes = fs::read(path)
        .map_err(|e| RedaktError::Io(format!("Failed to read {}: {e}", path.display())))?;
    let text = String::from_utf8(bytes).map_err(|_| {
        RedaktError::InvalidInput(format!("{} is not valid UTF-8 text", path.display()))
    })?;
    Ok(match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    })
}

/// Output locations of one input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub anon: PathBuf,
    pub map_json: PathBuf,
    pub map_text: PathBuf,
}

/// Places and writes output files according to [`OutputConfig`]
#[derive(Debug, Clone)]
pub struct OutputWriter {
    config: OutputConfig,
}

impl OutputWriter {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    /// Output paths for `input`
    pub fn paths_for(&self, input: &Path) -> Result<OutputPaths> {
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                RedaktError::InvalidInput(format!("{} has no usable file name", input.display()))
            })?;
        let dir = match &self.config.directory {
            Some(dir) => dir.clone(),
            None => input
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        };
        Ok(OutputPaths {
            anon: dir.join(format!("{stem}{}.txt", self.config.anon_suffix)),
            map_json: dir.join(format!("{stem}{}.json", self.config.map_suffix)),
            map_text: dir.join(format!("{stem}{}.txt", self.config.map_suffix)),
        })
    }

    /// Whether `path` is an output of a sibling input: `<stem><suffix>.txt`
    /// next to an existing `<stem>.txt`
    pub fn is_output_file(&self, path: &Path) -> bool {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            return false;
        };
        [&self.config.anon_suffix, &self.config.map_suffix]
            .into_iter()
            .filter_map(|suffix| stem.strip_suffix(suffix.as_str()))
            .filter(|base| !base.is_empty())
            .any(|base| path.with_file_name(format!("{base}.txt")).is_file())
    }

    /// Write the outputs of a finalized document
    pub fn write(&self, input: &Path, document: &AnonymizedDocument) -> Result<DocumentOutputs> {
        let paths = self.paths_for(input)?;

        let mut files = vec![
            (paths.anon.clone(), document.text.clone()),
            (paths.map_json.clone(), document.map.to_json()?),
        ];
        if self.config.text_map {
            files.push((paths.map_text.clone(), document.map_text()));
        }

        if !self.config.overwrite {
            if let Some((existing, _)) = files.iter().find(|(path, _)| path.exists()) {
                return Err(RedaktError::Io(format!(
                    "{} already exists (set output.overwrite to replace it)",
                    existing.display()
                )));
            }
        }

        if let Some(dir) = paths.anon.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| {
                RedaktError::Io(format!("Failed to create output directory {}: {e}", dir.display()))
            })?;
        }

        let mut partials = Vec::with_capacity(files.len());
        for (path, content) in &files {
            let partial = partial_path(path);
            if let Err(e) = fs::write(&partial, content) {
                remove_all(&partials);
                let _ = fs::remove_file(&partial);
                return Err(RedaktError::Io(format!("Failed to write {}: {e}", partial.display())));
            }
            partials.push(partial);
        }

        let mut placed = Vec::with_capacity(files.len());
        for (partial, (path, _)) in partials.iter().zip(&files) {
            if let Err(e) = fs::rename(partial, path) {
                remove_all(&partials);
                remove_all(&placed);
                return Err(RedaktError::Io(format!(
                    "Failed to move output into {}: {e}",
                    path.display()
                )));
            }
            placed.push(path.clone());
        }

        tracing::debug!(
            document = %document.document_id,
            output = %paths.anon.display(),
            "Outputs written"
        );

        Ok(DocumentOutputs {
            document: document.document_id.clone(),
            anon: paths.anon,
            map_json: paths.map_json,
            map_text: self.config.text_map.then_some(paths.map_text),
        })
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(PARTIAL_EXTENSION);
    PathBuf::from(name)
}

fn remove_all(paths: &[PathBuf]) {
    for path in paths {
        if path.exists() {
            let _ = fs::remove_file(path);
        }
    }
}
