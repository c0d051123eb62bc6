//! Where volume bytes come from.
//!
//! A viewer session asks a [`VolumeSource`] for two kinds of volumes: the
//! background template, and the overlay map of a query. Sources only
//! deliver bytes; decoding happens in the session.
//!
//! [`VolumeSource`]: trait.VolumeSource.html

use crate::config::SamplingParams;
use crate::error::{NiftiError, Result};
use futures::future::{self, BoxFuture, FutureExt};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// A volume to fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum VolumeRequest {
    /// The anatomical template
    Background,
    /// The statistical map of a query
    Overlay {
        /// Query text, passed on verbatim
        query: String,
        /// Map parameters
        sampling: SamplingParams,
    },
}

/// A provider of raw volume files.
pub trait VolumeSource: Send + Sync + 'static {
    /// Fetch the raw, possibly compressed, bytes of the requested volume.
    /// The returned future must not borrow the source, so that it can run
    /// on its own task.
    fn fetch(&self, request: &VolumeRequest) -> BoxFuture<'static, Result<Vec<u8>>>;
}

impl<S: VolumeSource + ?Sized> VolumeSource for Arc<S> {
    fn fetch(&self, request: &VolumeRequest) -> BoxFuture<'static, Result<Vec<u8>>> {
        (**self).fetch(request)
    }
}

fn not_found(what: &str) -> NiftiError {
    NiftiError::Network {
        status: Some(404),
        body: format!("no volume for {}", what),
    }
}

/// Volumes held in memory, keyed by query. Sampling parameters are ignored.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    background: Option<Arc<Vec<u8>>>,
    overlays: HashMap<String, Arc<Vec<u8>>>,
}

impl MemorySource {
    /// A source without any volume.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve these bytes as the background.
    pub fn with_background(mut self, bytes: Vec<u8>) -> Self {
        self.background = Some(Arc::new(bytes));
        self
    }

    /// Serve these bytes as the overlay of `query`.
    pub fn with_overlay<S: Into<String>>(mut self, query: S, bytes: Vec<u8>) -> Self {
        let _ = self.overlays.insert(query.into(), Arc::new(bytes));
        self
    }
}

impl VolumeSource for MemorySource {
    fn fetch(&self, request: &VolumeRequest) -> BoxFuture<'static, Result<Vec<u8>>> {
        let found = match request {
            VolumeRequest::Background => self
                .background
                .as_ref()
                .ok_or_else(|| not_found("the background")),
            VolumeRequest::Overlay { query, .. } => self
                .overlays
                .get(query)
                .ok_or_else(|| not_found(&format!("query {:?}", query))),
        };
        future::ready(found.map(|bytes| bytes.to_vec())).boxed()
    }
}

/// Volumes read from ".nii" or ".nii.gz" files.
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    background: Option<PathBuf>,
    overlays: HashMap<String, PathBuf>,
}

impl FileSource {
    /// A source without any file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the background from this file.
    pub fn with_background<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.background = Some(path.into());
        self
    }

    /// Read the overlay of `query` from this file.
    pub fn with_overlay<S: Into<String>, P: Into<PathBuf>>(mut self, query: S, path: P) -> Self {
        let _ = self.overlays.insert(query.into(), path.into());
        self
    }
}

impl VolumeSource for FileSource {
    fn fetch(&self, request: &VolumeRequest) -> BoxFuture<'static, Result<Vec<u8>>> {
        let path = match request {
            VolumeRequest::Background => self.background.clone(),
            VolumeRequest::Overlay { query, .. } => self.overlays.get(query).cloned(),
        };
        let path = match path {
            Some(path) => path,
            None => return future::ready(Err(not_found("the request"))).boxed(),
        };
        async move {
            debug!(path = %path.display(), "reading volume file");
            let read = tokio::task::spawn_blocking(move || std::fs::read(path))
                .await
                .map_err(|e| NiftiError::Network {
                    status: None,
                    body: e.to_string(),
                })?;
            read.map_err(|e| NiftiError::Network {
                status: None,
                body: e.to_string(),
            })
        }
        .boxed()
    }
}

#[cfg(feature = "http")]
pub use self::http::HttpSource;

#[cfg(feature = "http")]
mod http {
    use super::{VolumeRequest, VolumeSource};
    use crate::config::{SamplingParams, ViewerOptions};
    use crate::error::{NiftiError, Result};
    use futures::future::{BoxFuture, FutureExt};
    use reqwest::{Client, Url};
    use std::fmt::Display;
    use tracing::debug;

    fn invalid_url<E: Display>(e: E) -> NiftiError {
        NiftiError::Network {
            status: None,
            body: format!("invalid URL: {}", e),
        }
    }

    fn transport(e: reqwest::Error) -> NiftiError {
        NiftiError::Network {
            status: e.status().map(|s| s.as_u16()),
            body: e.to_string(),
        }
    }

    /// Volumes fetched from the map service over HTTP.
    ///
    /// The overlay of a query is found at
    /// `{api_base}/query/{query}/nii?voxel=..&fwhm=..&kernel=..&r=..`.
    #[derive(Debug, Clone)]
    pub struct HttpSource {
        client: Client,
        api_base: Url,
        background: Url,
    }

    impl HttpSource {
        /// Create a source for the given service. The background location
        /// may be relative to the API base.
        pub fn new(api_base: &str, background: &str) -> Result<Self> {
            let api_base = Url::parse(&format!("{}/", api_base.trim_end_matches('/')))
                .map_err(invalid_url)?;
            if api_base.cannot_be_a_base() {
                return Err(invalid_url(api_base));
            }
            let background = api_base.join(background).map_err(invalid_url)?;
            Ok(HttpSource {
                client: Client::new(),
                api_base,
                background,
            })
        }

        /// Create a source from the addresses in the viewer options.
        pub fn from_options(options: &ViewerOptions) -> Result<Self> {
            Self::new(options.get_api_base(), options.get_background())
        }

        /// Address of the background volume.
        pub fn background_url(&self) -> &Url {
            &self.background
        }

        /// Address of the overlay volume of a query.
        pub fn overlay_url(&self, query: &str, sampling: &SamplingParams) -> Result<Url> {
            let mut url = self.api_base.clone();
            url.path_segments_mut()
                .map_err(|_| invalid_url(&self.api_base))?
                .pop_if_empty()
                .extend(&["query", query, "nii"]);
            {
                let mut pairs = url.query_pairs_mut();
                for (key, value) in sampling.query_pairs().iter() {
                    let _ = pairs.append_pair(key, value);
                }
            }
            Ok(url)
        }

        /// Address of a request.
        pub fn url_for(&self, request: &VolumeRequest) -> Result<Url> {
            match request {
                VolumeRequest::Background => Ok(self.background.clone()),
                VolumeRequest::Overlay { query, sampling } => self.overlay_url(query, sampling),
            }
        }
    }

    impl VolumeSource for HttpSource {
        fn fetch(&self, request: &VolumeRequest) -> BoxFuture<'static, Result<Vec<u8>>> {
            let client = self.client.clone();
            let url = self.url_for(request);
            async move {
                let url = url?;
                debug!(%url, "fetching volume");
                let resp = client.get(url).send().await.map_err(transport)?;
                let status = resp.status();
                if !status.is_success() {
                    let body = resp.text().await.unwrap_or_default();
                    return Err(NiftiError::Network {
                        status: Some(status.as_u16()),
                        body,
                    });
                }
                let bytes = resp.bytes().await.map_err(transport)?;
                debug!(len = bytes.len(), "volume fetched");
                Ok(bytes.to_vec())
            }
            .boxed()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::{HttpSource, VolumeRequest, VolumeSource};
        use crate::config::SamplingParams;
        use crate::error::NiftiError;
        use reqwest::Client;
        use std::io::{Read, Write};
        use std::net::{SocketAddr, TcpListener};
        use std::thread::{self, JoinHandle};

        /// Answer a single request with the given status line and body.
        /// The thread yields the request head it received.
        fn serve_once(status: &'static str, body: &'static [u8]) -> (SocketAddr, JoinHandle<String>) {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let addr = listener.local_addr().unwrap();
            let handle = thread::spawn(move || {
                let (mut stream, _) = listener.accept().unwrap();
                let mut head = Vec::new();
                let mut buf = [0; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = stream.read(&mut buf).unwrap();
                    if n == 0 {
                        break;
                    }
                    head.extend_from_slice(&buf[..n]);
                }
                write!(
                    stream,
                    "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    status,
                    body.len()
                )
                .unwrap();
                stream.write_all(body).unwrap();
                String::from_utf8_lossy(&head).into_owned()
            });
            (addr, handle)
        }

        fn local_source(addr: SocketAddr) -> HttpSource {
            let source = HttpSource::new(&format!("http://{}", addr), "bg.nii").unwrap();
            HttpSource {
                client: Client::builder().no_proxy().build().unwrap(),
                ..source
            }
        }

        #[tokio::test]
        async fn fetch_success() {
            let (addr, server) = serve_once("200 OK", b"\x5c\x01\0\0");
            let bytes = local_source(addr)
                .fetch(&VolumeRequest::Background)
                .await
                .unwrap();
            assert_eq!(bytes, vec![0x5c, 1, 0, 0]);
            let head = server.join().unwrap();
            assert!(head.starts_with("GET /bg.nii HTTP/1.1\r\n"), "{}", head);
        }

        #[tokio::test]
        async fn error_status_keeps_the_body() {
            let (addr, server) = serve_once("404 Not Found", b"no such map");
            let request = VolumeRequest::Overlay {
                query: "pain".to_string(),
                sampling: SamplingParams::default(),
            };
            match local_source(addr).fetch(&request).await {
                Err(NiftiError::Network { status, body }) => {
                    assert_eq!(status, Some(404));
                    assert_eq!(body, "no such map");
                }
                other => panic!("unexpected result {:?}", other),
            }
            let head = server.join().unwrap();
            assert!(head.starts_with("GET /query/pain/nii?voxel=2&"), "{}", head);
        }

        #[tokio::test]
        async fn refused_connection_has_no_status() {
            let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
            // the listener is dropped, nothing accepts on this port any more
            match local_source(addr).fetch(&VolumeRequest::Background).await {
                Err(NiftiError::Network { status, body }) => {
                    assert_eq!(status, None);
                    assert!(!body.is_empty());
                }
                other => panic!("unexpected result {:?}", other),
            }
        }

        #[test]
        fn addresses() {
            let source = HttpSource::new("http://maps.test/api/", "static/mni_2mm.nii.gz").unwrap();
            assert_eq!(
                source.background_url().as_str(),
                "http://maps.test/api/static/mni_2mm.nii.gz"
            );
            let url = source
                .overlay_url("amygdala not fear", &SamplingParams::default())
                .unwrap();
            assert_eq!(
                url.as_str(),
                "http://maps.test/api/query/amygdala%20not%20fear/nii?voxel=2&fwhm=10&kernel=gauss&r=6"
            );

            let source = HttpSource::new("http://maps.test", "http://cdn.test/bg.nii").unwrap();
            assert_eq!(source.background_url().as_str(), "http://cdn.test/bg.nii");
            let url = source
                .overlay_url("a/b", &SamplingParams::default())
                .unwrap();
            assert!(url.as_str().starts_with("http://maps.test/query/a%2Fb/nii?"));
        }

        #[test]
        fn invalid_base() {
            assert!(HttpSource::new("not a url", "bg.nii").is_err());
        }
    }
}
