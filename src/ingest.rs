use aws_lambda_events::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use aws_lambda_events::encodings::Body;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue};
use itertools::Itertools;
use lambda_runtime::{Error, LambdaEvent};
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::events::CanDataPayload;
use crate::frame::{self, CanFrame, FrameError};
use crate::store::DynFrameStore;

// lambda handler
pub async fn function_handler(
    store: DynFrameStore,
    evt: LambdaEvent<ApiGatewayProxyRequest>,
) -> Result<ApiGatewayProxyResponse, Error> {
    info!("Handling ingestion request");
    debug!("Handling event payload: {:?}", evt.payload);

    let payload = match CanDataPayload::from_body(evt.payload.body.as_deref()) {
        Ok(payload) => payload,
        Err(error) => {
            warn!(%error, "Rejecting request");
            return Ok(json_response(400, json!({ "error": error.to_string() })));
        }
    };

    let lines = payload.into_lines();
    let parsed: Vec<Result<CanFrame, FrameError>> =
        lines.iter().map(|line| frame::parse_line(line)).collect();

    // The reported count covers every parsed record, malformed ones included.
    let record_count = parsed.len();
    let (frames, errors): (Vec<CanFrame>, Vec<FrameError>) =
        parsed.into_iter().partition_result();

    if !errors.is_empty() {
        warn!(
            "Skipping {} malformed frames out of {} records",
            errors.len(),
            record_count
        );
    }

    match store.put_frames(frames).await {
        Ok(()) => Ok(json_response(
            200,
            json!({
                "message": "Data uploaded successfully",
                "uploaded_data_count": record_count,
            }),
        )),
        Err(error) => {
            error!(%error, "Failed to store frames");
            Ok(json_response(
                500,
                json!({
                    "error": "Failed to upload data to DynamoDB",
                    "details": error.to_string(),
                }),
            ))
        }
    }
}

fn json_response(status_code: i64, body: serde_json::Value) -> ApiGatewayProxyResponse {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    ApiGatewayProxyResponse {
        status_code,
        headers,
        body: Some(Body::Text(body.to_string())),
        is_base64_encoded: false,
        ..Default::default()
    }
}
