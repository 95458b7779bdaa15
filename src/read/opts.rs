/// Caps applied while opening an archive, plus extraction behavior.
///
/// A 7z header is tiny compared to the structures it can describe, so a
/// hostile archive may declare absurd counts. Parsing already bounds every
/// allocation by the input size; these limits additionally bound the work
/// an application is willing to do for one archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
    pub max_files: usize,
    pub max_folders: usize,
    pub max_coders_per_folder: usize,
    /// Check pack-stream and per-file CRCs during extraction.
    pub verify_crc: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        return OpenOptions {
            max_files: 1 << 20,
            max_folders: 1 << 18,
            max_coders_per_folder: 64,
            verify_crc: true,
        };
    }
}

impl OpenOptions {
    pub fn max_files(mut self, n: usize) -> Self {
        self.max_files = n;
        return self;
    }

    pub fn max_folders(mut self, n: usize) -> Self {
        self.max_folders = n;
        return self;
    }

    pub fn verify_crc(mut self, yes: bool) -> Self {
        self.verify_crc = yes;
        return self;
    }
}
