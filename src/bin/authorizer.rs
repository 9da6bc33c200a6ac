use aws_config::BehaviorVersion;
use aws_sdk_s3::Client as S3Client;
use can_telemetry_ingestor::auth::{self, AuthorizerRequest};
use can_telemetry_ingestor::config::AuthConfig;
use can_telemetry_ingestor::set_up_logging;
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

    let config = AuthConfig::load_from_env()?;
    let aws_config = aws_config::load_defaults(BehaviorVersion::v2023_11_09()).await;
    let s3_client = S3Client::new(&aws_config);

    run(service_fn(|request: LambdaEvent<AuthorizerRequest>| {
        auth::function_handler(&s3_client, &config, request)
    }))
    .await
}
