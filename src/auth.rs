use std::collections::HashMap;
use std::string::String;

use aws_sdk_s3::Client as S3Client;
use aws_smithy_types::error::display::DisplayErrorContext;
use lambda_runtime::{Error, LambdaEvent};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::AuthConfig;

const BEARER_PREFIX: &str = "Bearer ";
const POLICY_VERSION: &str = "2012-10-17";
const INVOKE_ACTION: &str = "execute-api:Invoke";

/// The slice of the gateway authorizer event this function reads. Both
/// payload formats deliver the caller token either as a lowercase
/// `authorization` header or as the first `identitySource` entry.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthorizerRequest {
    pub headers: HashMap<String, String>,
    pub identity_source: Vec<String>,
    pub route_arn: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerResponse {
    pub principal_id: String,
    pub policy_document: PolicyDocument,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDocument {
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "Statement")]
    pub statement: Vec<PolicyStatement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyStatement {
    #[serde(rename = "Action")]
    pub action: String,
    #[serde(rename = "Effect")]
    pub effect: Effect,
    #[serde(rename = "Resource")]
    pub resource: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenFetchError {
    #[error("failed to read token object from s3: {0}")]
    Fetch(String),
    #[error("token object is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    #[error("token object is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("token document has no usable token field")]
    MissingToken,
}

#[derive(Debug, Deserialize)]
struct TokenDocument {
    token: Option<String>,
}

// lambda handler; only ever resolves to a policy document, never to an error
pub async fn function_handler(
    s3_client: &S3Client,
    config: &AuthConfig,
    evt: LambdaEvent<AuthorizerRequest>,
) -> Result<AuthorizerResponse, Error> {
    let request = evt.payload;
    debug!("Handling authorization request: {:?}", request);

    let resource = request.route_arn.clone().unwrap_or_else(|| "*".to_string());

    let Some(raw_token) = caller_token(&request) else {
        warn!("No authorization token found in request");
        return Ok(policy("user", Effect::Deny, resource));
    };
    let token = raw_token
        .strip_prefix(BEARER_PREFIX)
        .unwrap_or(&raw_token)
        .trim();

    let reference = match load_reference_token(s3_client, config).await {
        Ok(reference) => reference,
        Err(error) => {
            warn!(%error, "Unable to load reference token");
            return Ok(policy("user", Effect::Deny, resource));
        }
    };

    if token == reference {
        info!("Authorization successful");
        Ok(policy("user", Effect::Allow, resource))
    } else {
        warn!("Authorization failed, token mismatch");
        Ok(policy("user", Effect::Deny, resource))
    }
}

fn caller_token(request: &AuthorizerRequest) -> Option<String> {
    request
        .headers
        .get("authorization")
        .filter(|token| !token.is_empty())
        .cloned()
        .or_else(|| {
            request
                .identity_source
                .iter()
                .find(|token| !token.is_empty())
                .cloned()
        })
}

pub fn policy(principal_id: &str, effect: Effect, resource: String) -> AuthorizerResponse {
    AuthorizerResponse {
        principal_id: principal_id.to_string(),
        policy_document: PolicyDocument {
            version: POLICY_VERSION.to_string(),
            statement: vec![PolicyStatement {
                action: INVOKE_ACTION.to_string(),
                effect,
                resource,
            }],
        },
    }
}

/// Fetches the reference token fresh for every invocation. No caching, so a
/// rotated token takes effect on the next request.
pub async fn load_reference_token(
    s3_client: &S3Client,
    config: &AuthConfig,
) -> Result<String, TokenFetchError> {
    let data = get_bytes_from_s3(s3_client, &config.token_bucket, &config.token_key).await?;
    let text = String::from_utf8(data)?;
    let document: TokenDocument = serde_json::from_str(text.trim())?;

    match document.token.map(|token| token.trim().to_string()) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(TokenFetchError::MissingToken),
    }
}

async fn get_bytes_from_s3(
    s3_client: &S3Client,
    bucket: &str,
    key: &str,
) -> Result<Vec<u8>, TokenFetchError> {
    let response = s3_client
        .get_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| TokenFetchError::Fetch(DisplayErrorContext(&e).to_string()))?;

    let mut data = Vec::with_capacity(response.content_length.unwrap_or(1024) as usize);
    let mut body = response.body;
    while let Some(result) = body.next().await {
        let bytes = result.map_err(|e| TokenFetchError::Fetch(e.to_string()))?;
        data.extend_from_slice(&bytes[..]);
    }

    Ok(data)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_policy_document_shape() {
        let response = policy("user", Effect::Allow, "arn:aws:execute-api:eu-west-1:123:api/*".to_string());
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["principalId"], "user");
        assert_eq!(value["policyDocument"]["Version"], "2012-10-17");
        assert_eq!(
            value["policyDocument"]["Statement"][0]["Action"],
            "execute-api:Invoke"
        );
        assert_eq!(value["policyDocument"]["Statement"][0]["Effect"], "Allow");
        assert_eq!(
            value["policyDocument"]["Statement"][0]["Resource"],
            "arn:aws:execute-api:eu-west-1:123:api/*"
        );
    }

    #[test]
    fn test_deny_effect_serializes_as_deny() {
        let value = serde_json::to_value(policy("user", Effect::Deny, "*".to_string())).unwrap();
        assert_eq!(value["policyDocument"]["Statement"][0]["Effect"], "Deny");
    }

    #[test]
    fn test_caller_token_prefers_header() {
        let request = AuthorizerRequest {
            headers: HashMap::from([("authorization".to_string(), "Bearer abc".to_string())]),
            identity_source: vec!["Bearer other".to_string()],
            route_arn: None,
        };
        assert_eq!(caller_token(&request), Some("Bearer abc".to_string()));
    }

    #[test]
    fn test_caller_token_falls_back_to_identity_source() {
        let request = AuthorizerRequest {
            headers: HashMap::from([("authorization".to_string(), "".to_string())]),
            identity_source: vec!["Bearer abc".to_string()],
            route_arn: None,
        };
        assert_eq!(caller_token(&request), Some("Bearer abc".to_string()));
    }

    #[test]
    fn test_caller_token_absent() {
        assert_eq!(caller_token(&AuthorizerRequest::default()), None);
    }

    #[test]
    fn test_authorizer_request_parses_both_payload_styles() {
        let header_style: AuthorizerRequest = serde_json::from_str(
            r#"{"headers": {"authorization": "Bearer abc"}, "routeArn": "arn:route"}"#,
        )
        .unwrap();
        assert_eq!(caller_token(&header_style), Some("Bearer abc".to_string()));
        assert_eq!(header_style.route_arn.as_deref(), Some("arn:route"));

        let source_style: AuthorizerRequest =
            serde_json::from_str(r#"{"identitySource": ["Bearer abc"]}"#).unwrap();
        assert_eq!(caller_token(&source_style), Some("Bearer abc".to_string()));
        assert_eq!(source_style.route_arn, None);
    }
}
