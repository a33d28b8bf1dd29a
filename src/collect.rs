//! File collection: resolve a user-supplied path to an ordered [`FileSet`].
//!
//! A stage never walks the filesystem itself — it receives a `FileSet`
//! resolved here once, so every stage sees the same deterministic,
//! name-sorted view of the input. Directory scans look at direct children
//! only; recursing into subdirectories would make "which PDFs to process"
//! ambiguous, so that boundary is explicit.
//!
//! Single-file PDF inputs additionally have their `%PDF` magic bytes
//! validated so callers get a meaningful error up front rather than a
//! pdfium failure mid-stage.

use crate::error::SlideforgeError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The extension class a stage requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FileKind {
    Pdf,
    Image,
}

impl FileKind {
    /// Lower-case extensions accepted for this kind.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            FileKind::Pdf => &["pdf"],
            FileKind::Image => &["png", "jpg", "jpeg"],
        }
    }

    /// Human-readable label used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            FileKind::Pdf => "PDF",
            FileKind::Image => "image",
        }
    }

    fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                let e = e.to_lowercase();
                self.extensions().iter().any(|x| *x == e)
            })
            .unwrap_or(false)
    }
}

/// An ordered set of input files, all of one [`FileKind`].
///
/// Built once per stage by [`collect`]; guaranteed non-empty.
#[derive(Debug, Clone)]
pub struct FileSet {
    kind: FileKind,
    files: Vec<PathBuf>,
}

impl FileSet {
    /// Build a set from already-resolved paths, preserving their order.
    ///
    /// Used between workflow stages, where the paths are outputs of the
    /// previous stage rather than user input.
    pub fn from_paths(kind: FileKind, files: Vec<PathBuf>) -> Result<Self, SlideforgeError> {
        if files.is_empty() {
            return Err(SlideforgeError::EmptyInputSet {
                path: PathBuf::new(),
                expected: kind.label().to_string(),
            });
        }
        Ok(Self { kind, files })
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.iter()
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.files
    }
}

/// Resolve `input_path` to an ordered [`FileSet`] of the expected kind.
///
/// * Single file: one-element set if the extension matches, else
///   [`SlideforgeError::UnsupportedFileType`].
/// * Directory: every direct child matching the kind's extensions, sorted
///   by file name; zero matches is [`SlideforgeError::EmptyInputSet`].
/// * Missing path: [`SlideforgeError::PathNotFound`].
pub fn collect(input_path: &Path, kind: FileKind) -> Result<FileSet, SlideforgeError> {
    if !input_path.exists() {
        return Err(SlideforgeError::PathNotFound {
            path: input_path.to_path_buf(),
        });
    }

    if input_path.is_file() {
        return collect_single(input_path, kind);
    }

    let entries = std::fs::read_dir(input_path).map_err(|e| SlideforgeError::PathNotFound {
        path: PathBuf::from(format!("{} ({e})", input_path.display())),
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && kind.matches(p))
        .collect();

    // Sort by file name for a deterministic, reproducible processing order.
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    if files.is_empty() {
        return Err(SlideforgeError::EmptyInputSet {
            path: input_path.to_path_buf(),
            expected: kind.label().to_string(),
        });
    }

    debug!(
        count = files.len(),
        kind = kind.label(),
        "Collected input files from {}",
        input_path.display()
    );

    Ok(FileSet { kind, files })
}

fn collect_single(path: &Path, kind: FileKind) -> Result<FileSet, SlideforgeError> {
    if !kind.matches(path) {
        return Err(SlideforgeError::UnsupportedFileType {
            path: path.to_path_buf(),
            expected: kind.label().to_string(),
        });
    }

    if kind == FileKind::Pdf {
        verify_pdf_magic(path)?;
    }

    Ok(FileSet {
        kind,
        files: vec![path.to_path_buf()],
    })
}

/// Verify the `%PDF` magic bytes of a single-file input.
fn verify_pdf_magic(path: &Path) -> Result<(), SlideforgeError> {
    use std::io::Read;

    let mut f = std::fs::File::open(path).map_err(|_| SlideforgeError::PathNotFound {
        path: path.to_path_buf(),
    })?;
    let mut magic = [0u8; 4];
    if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
        return Err(SlideforgeError::UnreadablePdf {
            path: path.to_path_buf(),
            detail: format!("first bytes {magic:?} are not a PDF header"),
        });
    }
    Ok(())
}
