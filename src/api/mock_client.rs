use crate::api::client::{ByteStream, MockStreamProducer};
use anyhow::Result;
use bytes::Bytes;
use futures::stream;
use std::sync::{Arc, Mutex};

/// One scripted read from the mocked response body.
#[derive(Clone)]
pub enum MockChunk {
    Data(String),
    Fail(String),
}

/// Serves pre-recorded chat response bodies, one per `chat_stream` call.
#[derive(Clone)]
pub struct MockApiClient {
    responses: Arc<Mutex<Vec<Vec<MockChunk>>>>,
    sent: Arc<Mutex<Vec<String>>>,
}

impl MockApiClient {
    pub fn new(responses: Vec<Vec<MockChunk>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn sent_messages(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

impl MockStreamProducer for MockApiClient {
    fn create_mock_stream(&self, message: &str) -> Result<ByteStream> {
        self.sent.lock().unwrap().push(message.to_string());

        let mut responses_guard = self.responses.lock().unwrap();
        if responses_guard.is_empty() {
            return Err(anyhow::anyhow!(
                "MockApiClient: No more responses configured"
            ));
        }
        let current_chunks = responses_guard.remove(0);

        let byte_chunks: Vec<Result<Bytes>> = current_chunks
            .into_iter()
            .map(|chunk| match chunk {
                MockChunk::Data(text) => Ok(Bytes::from(text)),
                MockChunk::Fail(reason) => Err(anyhow::anyhow!(reason)),
            })
            .collect();

        Ok(Box::pin(stream::iter(byte_chunks)))
    }
}
