use std::fmt;
use std::path::PathBuf;

/// Statistics from a completed render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderStats {
    /// Output file
    pub path: PathBuf,
    /// Records in the batch
    pub records: usize,
    /// Dimensions declared
    pub dimensions: usize,
    /// Groups created
    pub groups: usize,
    /// Variables written
    pub variables: usize,
    /// Final file size in bytes
    pub bytes_written: u64,
}

impl fmt::Display for RenderStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Wrote {} records as {} variables in {} groups to {} ({} bytes)",
            self.records,
            self.variables,
            self.groups,
            self.path.display(),
            self.bytes_written
        )
    }
}
