use std::{
    fs::File,
    io::{BufRead as _, BufReader, Split},
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    canvas::channel_canvas::ChannelCanvas,
    foundation::{
        core::{Channel, Effect},
        error::{PixfxError, PixfxResult},
    },
};

/// One parsed manifest line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Source image, resolved against the manifest directory.
    pub input: PathBuf,
    /// Destination image, resolved against the manifest directory.
    pub output: PathBuf,
    /// Valid effects in column order.
    pub effects: Vec<Effect>,
    /// Effect tokens that were not recognized (kept for diagnostics).
    pub rejected: Vec<String>,
}

/// One (image, effect, channel) job. Immutable once created.
#[derive(Clone, Debug)]
pub struct WorkUnit {
    output: PathBuf,
    effect: Effect,
    ordinal: usize,
    channel: Channel,
    canvas: Arc<ChannelCanvas>,
}

impl WorkUnit {
    /// Source image path.
    pub fn input(&self) -> &Path {
        self.canvas.input()
    }

    /// Destination image path.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Effect to apply.
    pub fn effect(&self) -> Effect {
        self.effect
    }

    /// Position of the effect among the line's valid effects.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Channel this unit writes.
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Shared per-image state.
    pub fn canvas(&self) -> &Arc<ChannelCanvas> {
        &self.canvas
    }
}

impl std::fmt::Display for WorkUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.input().display(),
            self.output.display(),
            self.effect.code(),
            self.channel
        )
    }
}

/// Parse one manifest line: `input, output, effect[, effect...]`.
///
/// Blank lines yield `Ok(None)`. Lines with fewer than two columns, or with an empty path column,
/// are errors. Unknown effect tokens are collected in [`ManifestEntry::rejected`] and do not fail
/// the line.
pub fn parse_line(line: &str, base_dir: &Path) -> PixfxResult<Option<ManifestEntry>> {
    if line.trim().is_empty() {
        return Ok(None);
    }

    let mut cols = line.split(',').map(str::trim);
    let (Some(input), Some(output)) = (cols.next(), cols.next()) else {
        return Err(PixfxError::manifest(format!(
            "expected 'input, output, effect...' but got '{}'",
            line.trim()
        )));
    };
    if input.is_empty() || output.is_empty() {
        return Err(PixfxError::manifest(format!(
            "empty path column in '{}'",
            line.trim()
        )));
    }

    let mut effects = Vec::new();
    let mut rejected = Vec::new();
    for token in cols {
        match Effect::from_code(token) {
            Some(e) => effects.push(e),
            None => rejected.push(token.to_string()),
        }
    }

    Ok(Some(ManifestEntry {
        input: base_dir.join(input),
        output: base_dir.join(output),
        effects,
        rejected,
    }))
}

/// Expand one manifest line into its work units.
///
/// Malformed lines and unknown effect tokens are logged and contribute no units; the line's
/// valid effects are still expanded.
#[tracing::instrument(level = "debug", skip(base_dir))]
pub fn decompose(line: &str, base_dir: &Path) -> Vec<WorkUnit> {
    match parse_line(line, base_dir) {
        Ok(Some(entry)) => {
            for token in &entry.rejected {
                tracing::warn!(
                    input = %entry.input.display(),
                    token = %token,
                    "skipping unknown effect code"
                );
            }
            units_for(&entry)
        }
        Ok(None) => Vec::new(),
        Err(e) => {
            tracing::warn!(error = %e, "skipping malformed manifest line");
            Vec::new()
        }
    }
}

/// Build 4 units per effect (R, G, B, A order) sharing one fresh canvas.
///
/// An entry without valid effects yields nothing: its input is never decoded or written.
pub fn units_for(entry: &ManifestEntry) -> Vec<WorkUnit> {
    if entry.effects.is_empty() {
        tracing::debug!(input = %entry.input.display(), "no effects requested; image skipped");
        return Vec::new();
    }

    let total = entry.effects.len() * Channel::ALL.len();
    let canvas = Arc::new(ChannelCanvas::new(entry.input.clone(), total));
    let mut units = Vec::with_capacity(total);
    for (ordinal, &effect) in entry.effects.iter().enumerate() {
        for channel in Channel::ALL {
            units.push(WorkUnit {
                output: entry.output.clone(),
                effect,
                ordinal,
                channel,
                canvas: Arc::clone(&canvas),
            });
        }
    }
    units
}

/// Directory relative manifest paths resolve against.
pub fn manifest_base_dir(manifest: &Path) -> PathBuf {
    manifest
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Open `manifest` for line-oriented reading.
///
/// Lines come back as raw bytes without the trailing `\n`; text decoding is left to the caller
/// so that one undecodable line does not end the stream.
pub fn read_manifest(manifest: &Path) -> PixfxResult<Split<BufReader<File>>> {
    let f = File::open(manifest).map_err(|e| {
        PixfxError::manifest(format!("open manifest '{}': {e}", manifest.display()))
    })?;
    Ok(BufReader::new(f).split(b'\n'))
}

#[cfg(test)]
#[path = "../../tests/unit/manifest/decompose.rs"]
mod tests;
