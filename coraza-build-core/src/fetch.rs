//! Artifact download

use std::{
    fs::File,
    path::Path,
    time::Duration,
};

use anyhow::{
    Context,
    Result,
};
use reqwest::{
    StatusCode,
    blocking::{
        Client,
        ClientBuilder,
    },
};
use tracing::{
    error,
    info,
};

use crate::error::BuildError;

/// Downloads single resources to disk
#[derive(Debug, Clone)]
pub struct ArtifactFetcher {
    client: Client,
}

impl ArtifactFetcher {
    pub fn new() -> Result<Self> {
        let client = Self::client_builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    /// Client settings downloads run with. Release archives can be large
    /// and links slow, so requests never time out.
    pub fn client_builder() -> ClientBuilder {
        Client::builder().timeout(None::<Duration>)
    }

    /// Use a preconfigured HTTP client, typically from [`Self::client_builder`]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Stream `url` into `destination`
    ///
    /// The destination is created (or truncated) before the request is sent
    /// and is left in place when the download fails.
    pub fn fetch(&self, url: &str, destination: &Path) -> Result<()> {
        info!("Downloading {} to {}", url, destination.display());

        let mut out = File::create(destination)
            .with_context(|| format!("Failed to create {}", destination.display()))?;

        let mut response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("Failed to request {}", url))?;

        if response.status() != StatusCode::OK {
            error!("Artifact download returned HTTP {} from {}", response.status(), url);
            return Err(BuildError::BadStatus {
                status: response.status().to_string(),
                url:    url.to_string(),
            }
            .into());
        }

        let written = response
            .copy_to(&mut out)
            .with_context(|| format!("Failed to write {}", destination.display()))?;
        info!("Downloaded {} bytes", written);

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{
        io::{
            Read,
            Write,
        },
        net::TcpListener,
        thread,
    };

    use tempfile::TempDir;
    use tiny_http::{
        Response,
        Server,
    };

    use super::*;

    /// Fetcher that talks to the test server directly, whatever proxy the
    /// environment configures
    pub(crate) fn local_fetcher() -> ArtifactFetcher {
        ArtifactFetcher::with_client(ArtifactFetcher::client_builder().no_proxy().build().unwrap())
    }

    /// Serve one request with the given status and body, return the base URL
    fn serve_once(status: u16, body: &'static [u8]) -> String {
        let server = Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        thread::spawn(move || {
            if let Ok(request) = server.recv() {
                let _ = request.respond(Response::from_data(body).with_status_code(status));
            }
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_fetch_writes_body_to_destination() {
        let base = serve_once(200, b"zip bytes");
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("artifact.zip");

        local_fetcher().fetch(&format!("{}/artifact.zip", base), &dest).unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"zip bytes");
    }

    #[test]
    fn test_not_found_is_an_error_and_leaves_file() {
        let base = serve_once(404, b"Not Found");
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("artifact.zip");

        let err = local_fetcher()
            .fetch(&format!("{}/missing.zip", base), &dest)
            .unwrap_err();

        match err.downcast_ref::<BuildError>() {
            Some(BuildError::BadStatus { status, .. }) => assert!(status.contains("404")),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(dest.exists());
    }

    #[test]
    fn test_missing_destination_directory_fails_before_request() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("no-such-dir").join("artifact.zip");

        let err = local_fetcher().fetch("http://127.0.0.1:9/never", &dest).unwrap_err();

        assert!(err.to_string().contains("Failed to create"));
    }

    #[test]
    fn test_slow_body_is_not_cut_off() {
        // outlasts reqwest's default 30s request timeout
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = [0u8; 1024];
            let _ = stream.read(&mut request);
            stream
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\nConnection: close\r\n\r\nzi")
                .unwrap();
            stream.flush().unwrap();
            thread::sleep(Duration::from_secs(32));
            stream.write_all(b"p!").unwrap();
        });
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("artifact.zip");

        local_fetcher().fetch(&format!("http://{}/slow.zip", addr), &dest).unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"zip!");
    }
}
