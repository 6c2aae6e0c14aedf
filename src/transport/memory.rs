use super::{FetchRequest, QueryExecutor};
use crate::decode::RawResponse;
use crate::error::{PanelError, PanelResult};
use async_trait::async_trait;
use tokio::sync::Mutex;

/// Serves canned responses, one per segment, and records every request.
pub struct MemoryExecutor {
    segments: Vec<RawResponse>,
    requests: Mutex<Vec<FetchRequest>>,
}

impl MemoryExecutor {
    pub fn new(segments: Vec<RawResponse>) -> Self {
        Self {
            segments,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub async fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl QueryExecutor for MemoryExecutor {
    async fn execute(&self, request: &FetchRequest) -> PanelResult<RawResponse> {
        self.requests.lock().await.push(request.clone());
        self.segments
            .get(request.segment)
            .cloned()
            .ok_or_else(|| PanelError::Backend {
                message: format!("no response scripted for segment {}", request.segment),
            })
    }

    fn segment_count(&self) -> usize {
        self.segments.len()
    }
}
