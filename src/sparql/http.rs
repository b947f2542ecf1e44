//! Rewrite executor speaking the SPARQL 1.1 protocol over HTTP(S).
//!
//! Updates are POSTed as `application/sparql-update`; previews are POSTed as
//! `application/sparql-query` and read back as N-Triples.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use oxigraph::model::Triple;

use crate::config::EndpointConfig;
use crate::error::{ConfigResult, RemoteError, RemoteResult};
use crate::graph::rdf::read_ntriples;

use super::{Rewrite, RewriteExecutor};

/// A remote SPARQL store. Holds one connection agent for its lifetime.
pub struct HttpEndpoint {
    query_url: String,
    update_url: String,
    authorization: Option<String>,
    http: ureq::Agent,
}

impl HttpEndpoint {
    /// Validate the configuration and build the agent.
    pub fn new(config: &EndpointConfig) -> ConfigResult<Self> {
        config.validate()?;
        let authorization = config.user.as_ref().map(|user| {
            let password = config.password.as_deref().unwrap_or_default();
            format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
        });
        let http = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();
        Ok(Self {
            query_url: config.url.clone(),
            update_url: config.update_url().to_string(),
            authorization,
            http,
        })
    }

    pub fn query_url(&self) -> &str {
        &self.query_url
    }

    pub fn update_url(&self) -> &str {
        &self.update_url
    }

    fn post(&self, url: &str, content_type: &str) -> ureq::Request {
        let request = self.http.post(url).set("Content-Type", content_type);
        match &self.authorization {
            Some(auth) => request.set("Authorization", auth),
            None => request,
        }
    }
}

fn remote_error(endpoint: &str, err: ureq::Error) -> RemoteError {
    match err {
        ureq::Error::Status(status, response) => RemoteError::Status {
            endpoint: endpoint.to_string(),
            status,
            body: response.into_string().unwrap_or_default(),
        },
        ureq::Error::Transport(transport) => RemoteError::Request {
            endpoint: endpoint.to_string(),
            message: transport.to_string(),
        },
    }
}

impl RewriteExecutor for HttpEndpoint {
    fn apply(&self, rewrite: &Rewrite) -> RemoteResult<()> {
        let update = rewrite.to_update();
        tracing::debug!(endpoint = %self.update_url, bytes = update.len(), "posting update");
        self.post(&self.update_url, "application/sparql-update")
            .send_string(&update)
            .map_err(|e| remote_error(&self.update_url, e))?;
        Ok(())
    }

    fn preview(&self, rewrite: &Rewrite) -> RemoteResult<Vec<Triple>> {
        let query = rewrite.to_preview();
        tracing::debug!(endpoint = %self.query_url, bytes = query.len(), "posting preview");
        let response = self
            .post(&self.query_url, "application/sparql-query")
            .set("Accept", "application/n-triples")
            .send_string(&query)
            .map_err(|e| remote_error(&self.query_url, e))?;
        read_ntriples(response.into_reader()).map_err(|e| RemoteError::Response {
            message: e.to_string(),
        })
    }
}

impl std::fmt::Debug for HttpEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpEndpoint")
            .field("query_url", &self.query_url)
            .field("update_url", &self.update_url)
            .field("authenticated", &self.authorization.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    fn config(url: &str) -> EndpointConfig {
        EndpointConfig {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Serve exactly one request with a canned response and hand back the raw
    /// request (head and body).
    fn serve_once(status: &'static str, body: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/sparql", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request = String::new();
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap();
                }
                request.push_str(&line);
                if line == "\r\n" || line.is_empty() {
                    break;
                }
            }
            let mut payload = vec![0; content_length];
            reader.read_exact(&mut payload).unwrap();
            request.push_str(&String::from_utf8(payload).unwrap());

            write!(
                stream,
                "HTTP/1.1 {status}\r\nContent-Type: application/n-triples\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            )
            .unwrap();
            stream.write_all(body.as_bytes()).unwrap();
            stream.flush().unwrap();
            request
        });
        (url, handle)
    }

    fn header<'a>(request: &'a str, name: &str) -> Option<&'a str> {
        request.lines().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.eq_ignore_ascii_case(name).then(|| value.trim())
        })
    }

    #[test]
    fn basic_auth_header() {
        let endpoint = HttpEndpoint::new(&EndpointConfig {
            user: Some("admin".into()),
            password: Some("secret".into()),
            ..config("http://localhost:9999/sparql")
        })
        .unwrap();
        assert_eq!(
            endpoint.authorization.as_deref(),
            Some("Basic YWRtaW46c2VjcmV0")
        );
    }

    #[test]
    fn update_url_defaults_to_query_url() {
        let endpoint = HttpEndpoint::new(&config("https://example.org/sparql")).unwrap();
        assert_eq!(endpoint.update_url(), "https://example.org/sparql");
        assert!(endpoint.authorization.is_none());
    }

    #[test]
    fn rejects_non_http_endpoint() {
        assert!(matches!(
            HttpEndpoint::new(&config("ftp://example.org/sparql")),
            Err(ConfigError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn unreachable_store_is_a_request_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let endpoint = HttpEndpoint::new(&EndpointConfig {
            timeout_secs: 2,
            ..config("http://127.0.0.1:9/sparql")
        })
        .unwrap();
        let rw = Rewrite::insert("?s ?p ?o .", "?s ?p ?o .");
        assert!(matches!(endpoint.apply(&rw), Err(RemoteError::Request { .. })));
        assert!(matches!(endpoint.preview(&rw), Err(RemoteError::Request { .. })));
    }

    #[test]
    fn update_is_posted_with_credentials() {
        let (url, server) = serve_once("200 OK", String::new());
        let endpoint = HttpEndpoint::new(&EndpointConfig {
            user: Some("admin".into()),
            password: Some("secret".into()),
            ..config(&url)
        })
        .unwrap();
        let rw = Rewrite::delete("?s ?p ?o .", "?s ?p ?o .");

        endpoint.apply(&rw).unwrap();
        let request = server.join().unwrap();

        assert!(request.starts_with("POST /sparql HTTP/1.1\r\n"));
        assert_eq!(
            header(&request, "Content-Type"),
            Some("application/sparql-update")
        );
        assert_eq!(
            header(&request, "Authorization"),
            Some("Basic YWRtaW46c2VjcmV0")
        );
        assert!(request.ends_with(&rw.to_update()));
    }

    #[test]
    fn error_status_keeps_the_body() {
        let (url, server) = serve_once("503 Service Unavailable", "store is busy".into());
        let endpoint = HttpEndpoint::new(&config(&url)).unwrap();

        let err = endpoint
            .apply(&Rewrite::insert("?s ?p ?o .", "?s ?p ?o ."))
            .unwrap_err();
        server.join().unwrap();

        match err {
            RemoteError::Status {
                endpoint,
                status,
                body,
            } => {
                assert_eq!(endpoint, url);
                assert_eq!(status, 503);
                assert_eq!(body, "store is busy");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn preview_parses_ntriples_response() {
        let body = "<http://ex.com/s> <http://ex.com/p> \"o\" .\n\
                    <http://ex.com/s> <http://ex.com/q> <http://ex.com/o> .\n";
        let (url, server) = serve_once("200 OK", body.into());
        let endpoint = HttpEndpoint::new(&config(&url)).unwrap();
        let rw = Rewrite::insert("?s ?p ?o .", "?s ?p ?o .");

        let triples = endpoint.preview(&rw).unwrap();
        let request = server.join().unwrap();

        assert_eq!(triples.len(), 2);
        assert_eq!(triples[0].to_string(), "<http://ex.com/s> <http://ex.com/p> \"o\"");
        assert_eq!(
            header(&request, "Content-Type"),
            Some("application/sparql-query")
        );
        assert_eq!(header(&request, "Accept"), Some("application/n-triples"));
        assert_eq!(header(&request, "Authorization"), None);
        assert!(request.contains("CONSTRUCT {"));
    }

    #[test]
    fn empty_preview_is_not_an_error() {
        let (url, server) = serve_once("200 OK", String::new());
        let endpoint = HttpEndpoint::new(&config(&url)).unwrap();

        let triples = endpoint
            .preview(&Rewrite::delete("?s ?p ?o .", "?s ?p ?o ."))
            .unwrap();
        server.join().unwrap();
        assert!(triples.is_empty());
    }

    #[test]
    fn large_preview_is_streamed() {
        // Past ureq's 10 MB limit for buffered bodies.
        let mut body = String::new();
        let mut n = 0;
        while body.len() < 11 * 1024 * 1024 {
            body.push_str(&format!(
                "<http://ex.com/s{n}> <http://www.wikidata.org/prop/direct/C3001> \"{n}\" .\n"
            ));
            n += 1;
        }
        let (url, server) = serve_once("200 OK", body);
        let endpoint = HttpEndpoint::new(&config(&url)).unwrap();

        let triples = endpoint
            .preview(&Rewrite::delete("?s ?p ?o .", "?s ?p ?o ."))
            .unwrap();
        server.join().unwrap();
        assert_eq!(triples.len(), n);
    }
}
