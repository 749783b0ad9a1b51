use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Retrieval of CPT documents by registry identifier
// ---------------------------------------------------------------------------

/// Public BRO endpoint serving CPT objects by identifier.
pub const BRO_CPT_BASE_URL: &str = "https://publiek.broservices.nl/sr/cpt/v1/objects/";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The server answered with a non-success status
    #[error("request for {id} failed with status {status}")]
    Status { id: String, status: u16 },

    /// The request never produced a response
    #[error("request for {id} failed: {source}")]
    Transport {
        id: String,
        #[source]
        source: reqwest::Error,
    },

    /// Reading a local document failed
    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Anything that can hand out the raw bytes of a CPT document.
///
/// No retries happen here or in callers: one failure is one failed
/// identifier.
pub trait SoundingSource {
    fn fetch(&self, id: &str) -> Result<Vec<u8>, FetchError>;
}

// ---------------------------------------------------------------------------
// BRO REST client
// ---------------------------------------------------------------------------

/// Blocking HTTP client for the BRO CPT registry.
pub struct BroClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl BroClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// URL of the document for `id`.
    pub fn url_for(&self, id: &str) -> String {
        if self.base_url.ends_with('/') {
            format!("{}{id}", self.base_url)
        } else {
            format!("{}/{id}", self.base_url)
        }
    }
}

impl SoundingSource for BroClient {
    fn fetch(&self, id: &str) -> Result<Vec<u8>, FetchError> {
        let url = self.url_for(id);
        log::info!("fetching {url}");

        let transport = |source| FetchError::Transport {
            id: id.to_string(),
            source,
        };
        let response = self.client.get(&url).send().map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                id: id.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().map_err(transport)?;
        log::debug!("{id}: received {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }
}

// ---------------------------------------------------------------------------
// Local directory of previously downloaded documents
// ---------------------------------------------------------------------------

/// Reads `<dir>/<id>.xml`.
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.xml"))
    }
}

impl SoundingSource for DirectorySource {
    fn fetch(&self, id: &str) -> Result<Vec<u8>, FetchError> {
        let path = self.path_for(id);
        log::info!("reading {}", path.display());
        std::fs::read(&path).map_err(|source| FetchError::Io { path, source })
    }
}
