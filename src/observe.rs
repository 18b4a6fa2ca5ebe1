use std::path::Path;

/// Receives progress events from [`crate::Serializer`] and [`crate::Deserializer`].
///
/// Every method defaults to doing nothing, so implementors only override what they care about.
pub trait Observer {
    /// A directory for `key_path` was created (or already existed).
    fn dir_created(&mut self, _key_path: &str) {}

    /// `bytes` bytes were written to `file` for the leaf at `key_path`.
    ///
    /// `file` is relative to the base directory the serializer was given, so a download reports
    /// `indexes/views/map.js` rather than a path inside the document.
    fn leaf_written(&mut self, _file: &Path, _key_path: &str, _bytes: usize) {}

    /// `bytes` bytes were read from `path` into the leaf at `key_path`.
    fn leaf_read(&mut self, _path: &Path, _key_path: &str, _bytes: usize) {}

    /// An entry could not be visited while walking and was left out of the document.
    fn entry_skipped(&mut self, _error: &walkdir::Error) {}
}

/// Forwards events to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn dir_created(&mut self, key_path: &str) {
        tracing::debug!("mkdir {}", key_path);
    }

    fn leaf_written(&mut self, file: &Path, key_path: &str, bytes: usize) {
        tracing::debug!(key_path, "wrote leaf");
        tracing::info!("{:5} bytes <- {}", bytes, file.display());
    }

    fn leaf_read(&mut self, path: &Path, key_path: &str, bytes: usize) {
        tracing::debug!(path = %path.display(), "read file");
        tracing::info!("{:5} bytes -> {}", bytes, key_path);
    }

    fn entry_skipped(&mut self, error: &walkdir::Error) {
        let path = error.path().map(|p| p.display().to_string());
        tracing::warn!(path = ?path, "skipping entry: {}", error);
    }
}
