use std::fmt;

/// Statistics from a completed write
#[derive(Debug, Clone)]
pub struct WriterStats {
    /// Records written to the file
    pub records_written: u64,
    /// Row groups the records were flushed into
    pub row_groups_written: usize,
    /// Total file size in bytes, footer and magic included
    pub file_size_bytes: u64,
}

impl fmt::Display for WriterStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "wrote {} records in {} row groups ({} bytes)",
            self.records_written, self.row_groups_written, self.file_size_bytes
        )
    }
}
