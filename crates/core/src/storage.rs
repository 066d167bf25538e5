//! On-disk storage layout and safe-write primitives.
//!
//! Every path the service writes is derived from a single configured root:
//!
//! ```text
//! <root>/public/images/prompt-example-images/
//! <root>/public/images/prompt-slot-variant-example-images/
//! <root>/public/images/articles/{mugs,shirts}/variant-example-images/
//! <root>/private/images/<user_id>/
//! <root>/private/images/0_prompt-test/
//! ```
//!
//! Writes go to `<name>.tmp` first and are renamed into place, so readers
//! never observe a partially written file.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::types::DbId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Directory (under `private/images/`) holding admin prompt-test outputs.
pub const PROMPT_TEST_DIR_NAME: &str = "0_prompt-test";

/// Suffix used for in-flight writes before the atomic rename.
const TMP_SUFFIX: &str = ".tmp";

static SAFE_FILENAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("valid regex"));

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The destination already exists and overwriting was not requested.
    #[error("Destination already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    /// A path segment failed [`safe_filename`] validation.
    #[error("Invalid filename: {0:?}")]
    InvalidFilename(String),

    /// Any other filesystem failure.
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Product family used to pick the article example-image directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductKind {
    Mug,
    Shirt,
}

impl ProductKind {
    /// Parse from the `articles.article_type` column (`MUG` / `SHIRT`).
    pub fn from_article_type(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "MUG" => Some(Self::Mug),
            "SHIRT" => Some(Self::Shirt),
            _ => None,
        }
    }

    /// Directory name under `public/images/articles/`.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Mug => "mugs",
            Self::Shirt => "shirts",
        }
    }
}

/// Resolves the well-known storage directories from a configured root.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn public_images(&self) -> PathBuf {
        self.root.join("public").join("images")
    }

    fn private_images(&self) -> PathBuf {
        self.root.join("private").join("images")
    }

    pub fn prompt_example_dir(&self) -> PathBuf {
        self.public_images().join("prompt-example-images")
    }

    pub fn slot_variant_example_dir(&self) -> PathBuf {
        self.public_images().join("prompt-slot-variant-example-images")
    }

    pub fn variant_example_dir(&self, kind: ProductKind) -> PathBuf {
        self.public_images()
            .join("articles")
            .join(kind.dir_name())
            .join("variant-example-images")
    }

    /// Private artwork directory of a single user.
    pub fn user_dir(&self, user_id: DbId) -> PathBuf {
        self.private_images().join(user_id.to_string())
    }

    pub fn prompt_test_dir(&self) -> PathBuf {
        self.private_images().join(PROMPT_TEST_DIR_NAME)
    }

    /// Resolve `filename` inside the user's private directory.
    ///
    /// The filename must pass [`safe_filename`]; nothing outside the user's
    /// directory can be addressed.
    pub fn user_file(&self, user_id: DbId, filename: &str) -> Result<PathBuf, StorageError> {
        let name = safe_filename(filename)?;
        Ok(self.user_dir(user_id).join(name))
    }

    /// Create every fixed public directory. Per-user directories are created
    /// lazily by [`store_bytes`].
    pub async fn ensure_public_dirs(&self) -> Result<(), StorageError> {
        let mut dirs = vec![
            self.prompt_example_dir(),
            self.slot_variant_example_dir(),
            self.prompt_test_dir(),
        ];
        dirs.push(self.variant_example_dir(ProductKind::Mug));
        dirs.push(self.variant_example_dir(ProductKind::Shirt));
        for dir in dirs {
            tokio::fs::create_dir_all(&dir).await?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Primitives
// ---------------------------------------------------------------------------

/// Accept only `[A-Za-z0-9._-]+`, rejecting the `.` and `..` segments.
///
/// All inbound path segments must pass this before being joined onto a
/// storage directory.
pub fn safe_filename(s: &str) -> Result<&str, StorageError> {
    if s == "." || s == ".." || !SAFE_FILENAME_RE.is_match(s) {
        return Err(StorageError::InvalidFilename(s.to_string()));
    }
    Ok(s)
}

/// Write `data` into `dir` atomically and return the absolute final path.
///
/// - `dir` is created when missing.
/// - An empty `name` is replaced by a fresh UUID.
/// - `ext` (with or without the leading dot) is appended when `name` has no
///   extension.
/// - With `overwrite == false` an existing destination yields
///   [`StorageError::AlreadyExists`].
pub async fn store_bytes(
    data: &[u8],
    dir: &Path,
    name: &str,
    ext: &str,
    overwrite: bool,
) -> Result<PathBuf, StorageError> {
    tokio::fs::create_dir_all(dir).await?;

    let base = if name.is_empty() {
        uuid::Uuid::new_v4().to_string()
    } else {
        safe_filename(name)?.to_string()
    };
    let filename = if Path::new(&base).extension().is_some() {
        base
    } else {
        let ext = ext.trim_start_matches('.');
        if ext.is_empty() {
            base
        } else {
            format!("{base}.{ext}")
        }
    };

    let final_path = std::path::absolute(dir.join(&filename))?;
    if !overwrite && tokio::fs::try_exists(&final_path).await? {
        return Err(StorageError::AlreadyExists(final_path));
    }

    let tmp_path = final_path.with_file_name(format!("{filename}{TMP_SUFFIX}"));
    tokio::fs::write(&tmp_path, data).await?;
    if let Err(e) = tokio::fs::rename(&tmp_path, &final_path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(e.into());
    }

    tracing::debug!(path = %final_path.display(), bytes = data.len(), "Stored file");
    Ok(final_path)
}

/// Read a file fully and infer its content type from the extension.
pub async fn load_bytes_and_type(path: &Path) -> Result<(Vec<u8>, String), StorageError> {
    let bytes = tokio::fs::read(path).await?;
    Ok((bytes, content_type_for(path)))
}

/// Content type inferred from the file extension, defaulting to
/// `application/octet-stream`.
pub fn content_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
