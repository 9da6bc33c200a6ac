use std::env;
use std::string::String;

/// Settings for the ingestion function.
pub struct IngestConfig {
    pub table_name: String,
}

impl IngestConfig {
    pub fn load_from_env() -> Result<IngestConfig, String> {
        let conf = IngestConfig {
            table_name: env::var("TABLE_NAME").unwrap_or("can_data".to_string()),
        };

        Ok(conf)
    }
}

/// Settings for the authorizer function. The reference token lives in a
/// single S3 object whose body is a JSON document with a `token` field.
#[derive(Debug)]
pub struct AuthConfig {
    pub token_bucket: String,
    pub token_key: String,
}

impl AuthConfig {
    pub fn load_from_env() -> Result<AuthConfig, String> {
        let conf = AuthConfig {
            token_bucket: env::var("TOKEN_BUCKET")
                .map_err(|e| format!("TOKEN_BUCKET not set - {}", e))?,
            token_key: env::var("TOKEN_KEY").unwrap_or("token.txt".to_string()),
        };

        Ok(conf)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_ingest_config_defaults() {
        temp_env::with_vars([("TABLE_NAME", None::<&str>)], || {
            let conf = IngestConfig::load_from_env().unwrap();
            assert_eq!(conf.table_name, "can_data");
        });

        temp_env::with_vars([("TABLE_NAME", Some("telemetry"))], || {
            let conf = IngestConfig::load_from_env().unwrap();
            assert_eq!(conf.table_name, "telemetry");
        });
    }

    #[test]
    fn test_auth_config_requires_bucket() {
        temp_env::with_vars([("TOKEN_BUCKET", None::<&str>)], || {
            let err = AuthConfig::load_from_env().unwrap_err();
            assert!(err.contains("TOKEN_BUCKET not set"), "got: {}", err);
        });

        temp_env::with_vars(
            [
                ("TOKEN_BUCKET", Some("telemetry-secrets")),
                ("TOKEN_KEY", None),
            ],
            || {
                let conf = AuthConfig::load_from_env().unwrap();
                assert_eq!(conf.token_bucket, "telemetry-secrets");
                assert_eq!(conf.token_key, "token.txt");
            },
        );
    }
}
