use super::{FetchRequest, QueryExecutor};
use crate::decode::RawResponse;
use crate::error::{PanelError, PanelResult};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

/// Reads each segment's response from a JSON file saved from the backend.
pub struct FileExecutor {
    paths: Vec<PathBuf>,
}

impl FileExecutor {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

#[async_trait]
impl QueryExecutor for FileExecutor {
    async fn execute(&self, request: &FetchRequest) -> PanelResult<RawResponse> {
        let path = self
            .paths
            .get(request.segment)
            .ok_or_else(|| PanelError::Backend {
                message: format!("no file for segment {}", request.segment),
            })?;
        debug!("Loading segment {} from {}", request.segment, path.display());

        let text = tokio::fs::read_to_string(path).await?;
        RawResponse::from_json(&text)
    }

    fn segment_count(&self) -> usize {
        self.paths.len()
    }
}
