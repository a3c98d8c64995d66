use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::model::{ApiResponse, GraphData};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed graph payload")]
    Json(#[from] serde_json::Error),
    #[error("request to {url} failed")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered {status}")]
    Status { url: String, status: reqwest::StatusCode },
}

/// Where the entity graph comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphSource {
    File(PathBuf),
    /// Dashboard base URL; the graph lives at `{base}/api/graph`.
    Api(String),
}

impl GraphSource {
    pub fn load(&self) -> Result<GraphData, LoadError> {
        let graph = match self {
            Self::File(path) => {
                let raw = fs::read_to_string(path).map_err(|source| LoadError::Io {
                    path: path.clone(),
                    source,
                })?;
                parse_graph(&raw)?
            }
            Self::Api(base) => fetch_graph(base)?,
        };
        info!(source = %self, nodes = graph.nodes.len(), edges = graph.edges.len(), "graph loaded");
        Ok(graph)
    }
}

impl fmt::Display for GraphSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Api(base) => f.write_str(&graph_url(base)),
        }
    }
}

fn graph_url(base: &str) -> String {
    format!("{}/api/graph", base.trim_end_matches('/'))
}

fn fetch_graph(base: &str) -> Result<GraphData, LoadError> {
    let url = graph_url(base);
    let http = |source| LoadError::Http { url: url.clone(), source };

    let client = Client::builder().timeout(REQUEST_TIMEOUT).build().map_err(http)?;
    let response = client
        .get(&url)
        .header("Accept", "application/json")
        .send()
        .map_err(http)?;

    let status = response.status();
    if !status.is_success() {
        return Err(LoadError::Status { url: url.clone(), status });
    }

    let body = response.text().map_err(http)?;
    debug!(%url, bytes = body.len(), "graph response received");
    parse_graph(&body)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    Envelope(ApiResponse<Option<GraphData>>),
    Bare(GraphData),
}

/// Accepts the API envelope (with `data` possibly null) or a bare
/// `{nodes, edges}` document.
pub fn parse_graph(raw: &str) -> Result<GraphData, LoadError> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    let graph = match serde_json::from_value(value)? {
        Payload::Envelope(response) => response.data.unwrap_or_default(),
        Payload::Bare(graph) => graph,
    };
    Ok(graph)
}
