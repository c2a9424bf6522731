use crate::command::Encoding;

/// Default chunk size for blocking reads.
pub const DEFAULT_READ_CHUNK: usize = 1024;

/// Configuration shared by [`CommandStream`](crate::CommandStream),
/// [`CommandReader`](crate::CommandReader) and
/// [`CommandWriter`](crate::CommandWriter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    /// Initial reassembly buffer size. `0` allocates on the first append.
    pub initial_capacity: usize,
    /// Bytes requested per `read` call.
    pub read_chunk_size: usize,
    /// Encoding used by the writer. `None` keeps each command's own family.
    pub output_encoding: Option<Encoding>,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 0,
            read_chunk_size: DEFAULT_READ_CHUNK,
            output_encoding: None,
        }
    }
}
