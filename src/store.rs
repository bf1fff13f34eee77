//! Local file layout: input discovery and per-document workspaces.
//!
//! Every document is keyed by its *base name* (file stem, extension
//! stripped). That key derives both the watermarked output file
//! (`<output_root>/<base>_watermarked.pdf`) and the workspace directory
//! (`<output_root>/<base>/`) holding the rasterised page images. Keeping the
//! naming convention in this one module means the transform and publish
//! stages exchange workspace *paths*, never re-derived strings.
//!
//! Workspaces live for a single run: created lazily, populated by the
//! transform stage, read by the publish stage, deleted by orchestrator
//! cleanup.

use crate::error::Pdf2DraftError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolves input files and manages per-document workspaces under a fixed
/// output root. Performs no remote calls.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    folder: PathBuf,
    output_root: PathBuf,
}

impl DocumentStore {
    /// Create a store over the given source folder and output root.
    ///
    /// The output root is created immediately; the source folder is only
    /// checked when inputs are listed.
    pub fn new(
        folder: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
    ) -> Result<Self, Pdf2DraftError> {
        let folder = folder.into();
        let output_root = output_root.into();
        std::fs::create_dir_all(&output_root)
            .map_err(|e| Pdf2DraftError::io(&output_root, e))?;
        Ok(Self {
            folder,
            output_root,
        })
    }

    /// The source folder scanned for inputs.
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// The root under which all derived files are written.
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Extension-stripped file stem used as the stable per-document key.
    pub fn base_name(path: &Path) -> String {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// List PDF files in the source folder, sorted by path.
    ///
    /// The filter is case-insensitive on the extension (`.pdf`, `.PDF`, …).
    /// An empty result is valid; a missing folder is
    /// [`Pdf2DraftError::FolderNotFound`]. Sorting makes the processing
    /// order independent of directory-entry ordering.
    pub fn list_inputs(&self) -> Result<Vec<PathBuf>, Pdf2DraftError> {
        if !self.folder.is_dir() {
            return Err(Pdf2DraftError::FolderNotFound {
                path: self.folder.clone(),
            });
        }

        let entries =
            std::fs::read_dir(&self.folder).map_err(|e| Pdf2DraftError::io(&self.folder, e))?;

        let mut inputs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Pdf2DraftError::io(&self.folder, e))?;
            let path = entry.path();
            let is_pdf = path.is_file()
                && path
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case("pdf"))
                    .unwrap_or(false);
            if is_pdf {
                inputs.push(path);
            }
        }
        inputs.sort();
        debug!("Found {} PDF input(s) in {}", inputs.len(), self.folder.display());
        Ok(inputs)
    }

    /// Path of the watermarked copy derived from `base_name`.
    pub fn watermarked_path(&self, base_name: &str) -> PathBuf {
        self.output_root.join(format!("{base_name}_watermarked.pdf"))
    }

    /// Create (idempotently) and return the workspace for `base_name`.
    pub fn ensure_workspace(&self, base_name: &str) -> Result<PathBuf, Pdf2DraftError> {
        let workspace = self.output_root.join(base_name);
        std::fs::create_dir_all(&workspace).map_err(|e| Pdf2DraftError::io(&workspace, e))?;
        Ok(workspace)
    }

    /// Locate an existing workspace for `base_name`.
    ///
    /// Distinguishes "never created" ([`Pdf2DraftError::WorkspaceNotFound`])
    /// from "created but empty" (`Ok` with an empty directory).
    pub fn get_workspace(&self, base_name: &str) -> Result<PathBuf, Pdf2DraftError> {
        let workspace = self.output_root.join(base_name);
        if !workspace.is_dir() {
            return Err(Pdf2DraftError::WorkspaceNotFound {
                base_name: base_name.to_string(),
                path: workspace,
            });
        }
        Ok(workspace)
    }

    /// Recursively delete a workspace if present.
    ///
    /// Returns whether anything was removed. A missing path is `Ok(false)`,
    /// not an error; deletion is best-effort and idempotent.
    pub fn delete_workspace(&self, workspace: &Path) -> Result<bool, Pdf2DraftError> {
        if !workspace.exists() {
            return Ok(false);
        }
        std::fs::remove_dir_all(workspace).map_err(|e| Pdf2DraftError::io(workspace, e))?;
        debug!("Deleted workspace {}", workspace.display());
        Ok(true)
    }

    /// List the PNG page images of a workspace, sorted by filename.
    ///
    /// Page filenames embed a zero-padded 1-based index, so the plain
    /// lexicographic sort recovers page order.
    pub fn list_page_images(&self, workspace: &Path) -> Result<Vec<PathBuf>, Pdf2DraftError> {
        let entries =
            std::fs::read_dir(workspace).map_err(|e| Pdf2DraftError::io(workspace, e))?;

        let mut images = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Pdf2DraftError::io(workspace, e))?;
            let path = entry.path();
            let is_png = path.is_file()
                && path
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case("png"))
                    .unwrap_or(false);
            if is_png {
                images.push(path);
            }
        }
        images.sort();
        Ok(images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(tmp: &TempDir) -> DocumentStore {
        DocumentStore::new(tmp.path().join("inbox"), tmp.path().join("output")).unwrap()
    }

    fn touch(path: &Path) {
        std::fs::write(path, b"x").unwrap();
    }

    #[test]
    fn list_inputs_filters_extension_case_insensitively() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp);
        std::fs::create_dir_all(s.folder()).unwrap();
        touch(&s.folder().join("a.pdf"));
        touch(&s.folder().join("b.PDF"));
        touch(&s.folder().join("c.Pdf"));
        touch(&s.folder().join("notes.txt"));
        touch(&s.folder().join("pdfless"));
        std::fs::create_dir(s.folder().join("sub.pdf")).unwrap(); // directory, not a file

        let inputs = s.list_inputs().unwrap();
        let names: Vec<String> = inputs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.pdf", "b.PDF", "c.Pdf"]);
    }

    #[test]
    fn list_inputs_missing_folder_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp); // inbox never created
        let err = s.list_inputs().unwrap_err();
        assert!(matches!(err, Pdf2DraftError::FolderNotFound { .. }));
    }

    #[test]
    fn list_inputs_empty_folder_is_ok() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp);
        std::fs::create_dir_all(s.folder()).unwrap();
        assert!(s.list_inputs().unwrap().is_empty());
    }

    #[test]
    fn ensure_workspace_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp);
        let first = s.ensure_workspace("report").unwrap();
        let second = s.ensure_workspace("report").unwrap();
        assert_eq!(first, second);
        assert!(first.is_dir());
    }

    #[test]
    fn get_workspace_distinguishes_missing_from_empty() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp);

        let err = s.get_workspace("report").unwrap_err();
        assert!(matches!(err, Pdf2DraftError::WorkspaceNotFound { .. }));

        let created = s.ensure_workspace("report").unwrap();
        assert_eq!(s.get_workspace("report").unwrap(), created);
    }

    #[test]
    fn delete_workspace_missing_returns_false() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp);
        let absent = s.output_root().join("ghost");
        assert!(!s.delete_workspace(&absent).unwrap());
    }

    #[test]
    fn delete_workspace_removes_recursively_and_returns_true() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp);
        let ws = s.ensure_workspace("report").unwrap();
        touch(&ws.join("report_page_1.png"));

        assert!(s.delete_workspace(&ws).unwrap());
        assert!(!ws.exists());
        // second delete is a no-op, not an error
        assert!(!s.delete_workspace(&ws).unwrap());
    }

    #[test]
    fn page_images_sorted_by_filename() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp);
        let ws = s.ensure_workspace("deck").unwrap();
        touch(&ws.join("deck_page_10.png"));
        touch(&ws.join("deck_page_02.png"));
        touch(&ws.join("deck_page_01.png"));
        touch(&ws.join("thumbs.db"));

        let images = s.list_page_images(&ws).unwrap();
        let names: Vec<String> = images
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["deck_page_01.png", "deck_page_02.png", "deck_page_10.png"]
        );
    }

    #[test]
    fn base_name_strips_extension_only() {
        assert_eq!(DocumentStore::base_name(Path::new("/x/report.pdf")), "report");
        assert_eq!(
            DocumentStore::base_name(Path::new("v1.2-final.PDF")),
            "v1.2-final"
        );
    }

    #[test]
    fn watermarked_path_layout() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp);
        assert_eq!(
            s.watermarked_path("report"),
            s.output_root().join("report_watermarked.pdf")
        );
    }
}
