//! Saved-payload source for offline replays and fixtures.

use super::payload::RawPayload;
use super::provider::{DataSource, FetchError, SourceKind};
use crate::domain::{ApiKey, Symbol};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads a provider payload from disk.
///
/// If `path` is a directory the payload is read from `{path}/{SYMBOL}.json`;
/// otherwise the file itself is returned for every symbol.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path_for(&self, symbol: &Symbol) -> PathBuf {
        if self.path.is_dir() {
            self.path.join(format!("{symbol}.json"))
        } else {
            self.path.clone()
        }
    }
}

fn read(path: &Path) -> Result<RawPayload, FetchError> {
    let bytes = std::fs::read(path).map_err(|e| FetchError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    RawPayload::from_slice(&bytes).map_err(|e| FetchError::MalformedJson(e.to_string()))
}

impl DataSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::File
    }

    fn fetch(&self, _api_key: &ApiKey, symbol: &Symbol) -> Result<RawPayload, FetchError> {
        let path = self.path_for(symbol);
        debug!(path = %path.display(), symbol = %symbol, "reading saved payload");
        read(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> ApiKey {
        ApiKey::new("unused").unwrap()
    }

    #[test]
    fn reads_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.json");
        std::fs::write(&path, r#"{"Time Series (5min)": {}}"#).unwrap();

        let payload = FileSource::new(&path)
            .fetch(&key(), &Symbol::new("MSFT").unwrap())
            .unwrap();
        assert!(payload.series("Time Series (5min)").unwrap().is_empty());
    }

    #[test]
    fn reads_per_symbol_file_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("AAPL.json"), r#"{"Note": "hi"}"#).unwrap();

        let source = FileSource::new(dir.path());
        let payload = source.fetch(&key(), &Symbol::new("aapl").unwrap()).unwrap();
        assert_eq!(payload.provider_message().as_deref(), Some("hi"));

        let err = source
            .fetch(&key(), &Symbol::new("MSFT").unwrap())
            .unwrap_err();
        assert!(matches!(err, FetchError::Io { .. }));
    }

    #[test]
    fn malformed_file_is_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = FileSource::new(&path)
            .fetch(&key(), &Symbol::new("MSFT").unwrap())
            .unwrap_err();
        assert!(matches!(err, FetchError::MalformedJson(_)));
    }
}
