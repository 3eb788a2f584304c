//! HTTP download seam.
//!
//! The bootstrapper only needs a status, an optional length and a byte
//! stream, so the client sits behind [`HttpFetch`] and tests substitute a
//! canned implementation.

use std::io::Read;

use qxbuild_core::BuildResult;

/// A response whose body has not been consumed yet.
pub struct FetchResponse {
    pub status: u16,
    pub content_length: Option<u64>,
    pub body: Box<dyn Read + Send>,
}

impl std::fmt::Debug for FetchResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchResponse")
            .field("status", &self.status)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

pub trait HttpFetch {
    /// Issue a GET. Non-2xx statuses come back as a response, transport
    /// failures as [`qxbuild_core::BuildError::Network`].
    fn get(&self, url: &str) -> BuildResult<FetchResponse>;
}

impl<T: HttpFetch + ?Sized> HttpFetch for &T {
    fn get(&self, url: &str) -> BuildResult<FetchResponse> {
        (**self).get(url)
    }
}

#[cfg(feature = "download")]
const MAX_REDIRECTS: u32 = 8;

/// Blocking client on top of `ureq`.
pub struct UreqFetch {
    #[cfg(feature = "download")]
    agent: ureq::Agent,
}

impl UreqFetch {
    #[cfg(feature = "download")]
    pub fn new() -> Self {
        let agent = ureq::AgentBuilder::new()
            .redirects(MAX_REDIRECTS)
            .user_agent(concat!("qxbuild/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { agent }
    }

    #[cfg(not(feature = "download"))]
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for UreqFetch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "download")]
impl HttpFetch for UreqFetch {
    fn get(&self, url: &str) -> BuildResult<FetchResponse> {
        use qxbuild_core::BuildError;

        let resp = match self
            .agent
            .get(url)
            .set("Accept-Encoding", "gzip")
            .call()
        {
            Ok(resp) => resp,
            // ureq reports 4xx/5xx as errors; hand them back as responses so
            // the caller decides what a bad status means.
            Err(ureq::Error::Status(_, resp)) => resp,
            Err(e) => return Err(BuildError::network(url, e)),
        };

        let status = resp.status();
        let content_length = resp
            .header("Content-Length")
            .and_then(|v| v.trim().parse::<u64>().ok());
        Ok(FetchResponse {
            status,
            content_length,
            body: Box::new(resp.into_reader()),
        })
    }
}

#[cfg(not(feature = "download"))]
impl HttpFetch for UreqFetch {
    fn get(&self, url: &str) -> BuildResult<FetchResponse> {
        Err(qxbuild_core::BuildError::network(
            url,
            "downloading requires the 'download' feature (ureq)",
        ))
    }
}
