use crate::package::{archive_url, PackageDescriptor};
use crate::VendorError;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Source of package archives.
pub trait ArchiveFetcher {
    /// Download the archive for `package` and write it to `dest`.
    fn fetch(&self, package: &PackageDescriptor, dest: &Path) -> Result<(), VendorError>;
}

/// Fetches `{base}/{owner}/{project}/archive/{version}.tar.gz` over HTTP(S).
///
/// The agent is blocking and has no timeout; a stalled server stalls the run.
pub struct HttpFetcher {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new(base_url: &str) -> Self {
        let agent = ureq::Agent::new_with_defaults();
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            agent,
        }
    }
}

impl ArchiveFetcher for HttpFetcher {
    fn fetch(&self, package: &PackageDescriptor, dest: &Path) -> Result<(), VendorError> {
        let url = archive_url(&self.base_url, package);
        debug!("GET {url}");
        let resp = match self.agent.get(&url).call() {
            Ok(r) => r,
            Err(ureq::Error::StatusCode(code)) => {
                return Err(VendorError::Http(format!("HTTP {code} for {url}")));
            }
            Err(e) => return Err(VendorError::Http(format!("{url}: {e}"))),
        };

        let mut reader = resp.into_body().into_reader();
        let mut out = BufWriter::new(File::create(dest)?);
        let written = io::copy(&mut reader, &mut out)
            .map_err(|e| VendorError::Http(format!("{url}: {e}")))?;
        out.flush()?;
        debug!("wrote {written} bytes to {}", dest.display());
        Ok(())
    }
}
