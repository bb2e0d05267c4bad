use log::debug;
use std::{future::Future, sync::Arc};
use tokio::runtime::Runtime;

use crate::session::{DynamoDbConnection, DynamoDbSessionHandler, SessionHandlerConfig};

/// Synchronous wrapper around the DynamoDB client.
#[derive(Clone, Debug)]
pub struct DynamoDbClient {
    client: aws_sdk_dynamodb::Client,
    runtime: Arc<Runtime>,
}

impl DynamoDbClient {
    pub fn new(client: aws_sdk_dynamodb::Client, runtime: Arc<Runtime>) -> Self {
        Self { client, runtime }
    }

    pub fn inner(&self) -> &aws_sdk_dynamodb::Client {
        &self.client
    }

    /// Drives the given SDK future to completion.
    pub(crate) fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Builds a session handler storing sessions in the configured
    /// table, through this client.
    pub fn register_session_handler(&self, config: SessionHandlerConfig) -> DynamoDbSessionHandler {
        debug!(
            "register session handler on table {} (locking: {})",
            config.table_name, config.locking
        );
        let connection = DynamoDbConnection::new(self.clone(), config);
        DynamoDbSessionHandler::new(Box::new(connection))
    }
}
