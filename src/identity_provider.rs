use std::path::PathBuf;

use anyhow::Context;

/// Where the raw base64-encoded SAML response comes from. The browser
/// handshake that produces it lives outside this tool; the login flow only
/// needs something that can hand over the encoded string.
pub trait AssertionSource {
    fn raw_assertion(&self) -> anyhow::Result<String>;
}

/// Assertion captured to a file by an external browser driver.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl AssertionSource for FileSource {
    fn raw_assertion(&self) -> anyhow::Result<String> {
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("could not read assertion from {}", self.path.display()))?;
        Ok(raw.trim().to_string())
    }
}

/// Federation response cached in the profile configuration.
pub struct CachedResponse {
    response: String,
}

impl CachedResponse {
    pub fn new(response: String) -> Self {
        Self { response }
    }
}

impl AssertionSource for CachedResponse {
    fn raw_assertion(&self) -> anyhow::Result<String> {
        anyhow::ensure!(
            !self.response.is_empty(),
            "no cached federation response in the profile configuration; pass --assertion-file"
        );
        Ok(self.response.clone())
    }
}
