use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, PutRequest, WriteRequest};
use aws_sdk_dynamodb::Client as DynamoClient;
use aws_smithy_types::error::display::DisplayErrorContext;
use itertools::Itertools;
use tracing::{info, warn};

use crate::frame::CanFrame;

// DynamoDB rejects BatchWriteItem calls with more than 25 items.
const MAX_BATCH_ITEMS: usize = 25;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Write(String),
}

/// Durable sink for well-formed frames. The production implementation writes
/// to DynamoDB; tests substitute their own.
#[async_trait]
pub trait FrameStore: Send + Sync {
    async fn put_frames(&self, frames: Vec<CanFrame>) -> Result<(), StoreError>;
}

pub type DynFrameStore = Arc<dyn FrameStore>;

pub struct DynamoFrameStore {
    client: DynamoClient,
    table_name: String,
}

impl DynamoFrameStore {
    pub fn new(client: DynamoClient, table_name: String) -> Self {
        DynamoFrameStore { client, table_name }
    }

    fn item_attributes(frame: CanFrame) -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();
        item.insert("timestamp".to_string(), AttributeValue::S(frame.timestamp));
        item.insert("interface".to_string(), AttributeValue::S(frame.interface));
        item.insert("can_id".to_string(), AttributeValue::S(frame.can_id));
        item.insert("data".to_string(), AttributeValue::S(frame.data));
        item
    }

    fn write_request(frame: CanFrame) -> Result<WriteRequest, StoreError> {
        let put = PutRequest::builder()
            .set_item(Some(Self::item_attributes(frame)))
            .build()
            .map_err(|e| StoreError::Write(e.to_string()))?;

        Ok(WriteRequest::builder().put_request(put).build())
    }
}

#[async_trait]
impl FrameStore for DynamoFrameStore {
    async fn put_frames(&self, frames: Vec<CanFrame>) -> Result<(), StoreError> {
        if frames.is_empty() {
            info!("No frames to store");
            return Ok(());
        }

        let writes: Vec<WriteRequest> = frames
            .into_iter()
            .map(Self::write_request)
            .try_collect()?;

        info!(
            "Storing {} frames in {} batch writes",
            writes.len(),
            writes.len().div_ceil(MAX_BATCH_ITEMS)
        );

        for chunk in writes.chunks(MAX_BATCH_ITEMS) {
            let response = self
                .client
                .batch_write_item()
                .request_items(self.table_name.clone(), chunk.to_vec())
                .send()
                .await
                .map_err(|e| StoreError::Write(DisplayErrorContext(&e).to_string()))?;

            // Throttled leftovers are not retried; the storage backend owns
            // durability beyond the accepted write.
            if let Some(unprocessed) = response.unprocessed_items() {
                let leftover: usize = unprocessed.values().map(Vec::len).sum();
                if leftover > 0 {
                    warn!("{} items left unprocessed by batch write", leftover);
                }
            }
        }

        Ok(())
    }
}
