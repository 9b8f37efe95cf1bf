/// Configuration for the chunked object store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Fixed span size for chunk files. Every chunk except an object's last
    /// is exactly this many bytes.
    pub chunk_size_bytes: u64,

    /// Absolute max size allowed for a single object (safety guard)
    pub max_object_bytes: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            chunk_size_bytes: 255 * 1024, // the classic GridFS span
            max_object_bytes: 32 * 1024 * 1024,
        }
    }
}

impl StoreConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the chunk span size
    pub fn with_chunk_size(mut self, bytes: u64) -> Self {
        self.chunk_size_bytes = bytes;
        self
    }

    /// Set the max object size
    pub fn with_max_object_bytes(mut self, bytes: u64) -> Self {
        self.max_object_bytes = bytes;
        self
    }
}
