//! Archive handle type.

/// A downloadable module archive produced by a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveHandle {
    /// Suggested file name, e.g. `puppetlabs-apache-1.0.0.tar.gz`
    pub file_name: String,
    /// Archive bytes
    pub bytes: Vec<u8>,
}

impl ArchiveHandle {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
