//! Source files as handed over by the file-system collaborator.

use crate::error::DialectError;

/// A file path plus its full text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: String,
    pub content: String,
}

impl SourceFile {
    #[must_use]
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Decode raw bytes read from disk.
    ///
    /// # Errors
    ///
    /// Returns [`DialectError::NotUtf8`] when `bytes` is not UTF-8.
    pub fn from_bytes(path: impl Into<String>, bytes: Vec<u8>) -> Result<Self, DialectError> {
        let path = path.into();
        match String::from_utf8(bytes) {
            Ok(content) => Ok(Self { path, content }),
            Err(err) => Err(DialectError::NotUtf8 {
                path,
                offset: err.utf8_error().valid_up_to(),
            }),
        }
    }

    /// Number of lines, counting a final line without newline.
    #[must_use]
    pub fn line_count(&self) -> u32 {
        u32::try_from(self.content.lines().count()).unwrap_or(u32::MAX)
    }
}
