use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use log::{debug, trace};
use std::sync::Arc;
use tokio::runtime::{self, Runtime};

use crate::config::{AwsConfig, Config};

use super::{Error, Result};

const STATIC_CREDENTIALS_PROVIDER: &str = "aws-bridge-static";

/// Builds AWS service clients out of the process-wide AWS settings.
///
/// The factory owns a current-thread runtime, shared with every
/// client it builds, so that the async SDK can be driven from
/// synchronous code. Clients are never cached: each call builds a
/// fresh one.
#[derive(Clone, Debug)]
pub struct ClientFactory {
    config: AwsConfig,
    runtime: Arc<Runtime>,
}

impl ClientFactory {
    pub fn new(config: AwsConfig) -> Result<Self> {
        let runtime = runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(Error::BuildRuntimeError)?;

        Ok(Self {
            config,
            runtime: Arc::new(runtime),
        })
    }

    /// Builds a factory from the `[aws]` section of the config.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.aws.clone())
    }

    pub fn config(&self) -> &AwsConfig {
        &self.config
    }

    pub(crate) fn runtime(&self) -> Arc<Runtime> {
        self.runtime.clone()
    }

    /// Loads the SDK configuration, with the given overrides merged
    /// over the process-wide settings.
    ///
    /// The region and the static credentials are applied only when
    /// configured, otherwise the SDK default provider chains are
    /// used.
    pub fn sdk_config(&self, overrides: &AwsConfig) -> SdkConfig {
        trace!(">> load sdk config");

        let config = self.config.merge(overrides);
        if let Some(version) = config.version.as_deref() {
            if version != "latest" {
                debug!("api version {} is pinned by the SDK crates, using latest", version);
            }
        }

        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(region) = config.region() {
            debug!("region: {}", region);
            loader = loader.region(Region::new(region.to_owned()));
        }

        if let Some((key, secret)) = config.credentials() {
            debug!("using static credentials");
            loader = loader.credentials_provider(Credentials::new(
                key,
                secret,
                None,
                None,
                STATIC_CREDENTIALS_PROVIDER,
            ));
        }

        let sdk_config = self.runtime.block_on(loader.load());

        trace!("<< load sdk config");
        sdk_config
    }

    /// Builds a fresh SESv2 client.
    #[cfg(feature = "ses")]
    pub fn create_ses_v2(&self, overrides: &AwsConfig) -> super::SesV2Client {
        let client = aws_sdk_sesv2::Client::new(&self.sdk_config(overrides));
        debug!("SESv2 client built");
        super::SesV2Client::new(client, self.runtime())
    }

    /// Builds a fresh DynamoDB client.
    #[cfg(feature = "dynamodb")]
    pub fn create_dynamo_db(&self) -> super::DynamoDbClient {
        let client = aws_sdk_dynamodb::Client::new(&self.sdk_config(&AwsConfig::default()));
        debug!("DynamoDB client built");
        super::DynamoDbClient::new(client, self.runtime())
    }
}
