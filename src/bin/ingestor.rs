use std::sync::Arc;

use aws_config::BehaviorVersion;
use aws_lambda_events::apigw::ApiGatewayProxyRequest;
use aws_sdk_dynamodb::Client as DynamoClient;
use can_telemetry_ingestor::config::IngestConfig;
use can_telemetry_ingestor::store::{DynFrameStore, DynamoFrameStore};
use can_telemetry_ingestor::{ingest, set_up_logging};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Error> {
    set_up_logging();

    info!(
        "Initializing {} version {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let config = IngestConfig::load_from_env()?;
    let aws_config = aws_config::load_defaults(BehaviorVersion::v2023_11_09()).await;
    let store: DynFrameStore = Arc::new(DynamoFrameStore::new(
        DynamoClient::new(&aws_config),
        config.table_name,
    ));

    run(service_fn(|request: LambdaEvent<ApiGatewayProxyRequest>| {
        ingest::function_handler(store.clone(), request)
    }))
    .await
}
