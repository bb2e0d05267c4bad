use log::debug;

use crate::{
    client::ClientFactory,
    config::{self, Config},
};

use super::{DynamoDbSessionHandler, Result, SessionHandler, SessionHandlerConfig};

/// Session storage backed by DynamoDB, with locking enabled.
///
/// Every lifecycle call is forwarded as is to the underlying
/// [`DynamoDbSessionHandler`].
pub struct DynamoDbSession {
    handler: DynamoDbSessionHandler,
    session_name: String,
}

impl DynamoDbSession {
    /// Builds the session storage out of the `[session]` config
    /// section. Fails before building any client when the table name
    /// is missing.
    pub fn new(config: &Config, factory: &ClientFactory) -> config::Result<Self> {
        let table_name = config.session_table_name()?;
        let session_config = config.session.clone().unwrap_or_default();

        let handler_config =
            SessionHandlerConfig::from_session_config(table_name, &session_config).with_locking(true);
        let handler = factory
            .create_dynamo_db()
            .register_session_handler(handler_config);
        debug!("DynamoDB session storage ready on table {}", table_name);

        Ok(Self::from_handler(handler, session_config.name()))
    }

    pub fn from_handler<N: Into<String>>(handler: DynamoDbSessionHandler, session_name: N) -> Self {
        Self {
            handler,
            session_name: session_name.into(),
        }
    }

    pub fn handler(&self) -> &DynamoDbSessionHandler {
        &self.handler
    }
}

impl SessionHandler for DynamoDbSession {
    fn open(&mut self) -> Result<bool> {
        self.handler.open(None, &self.session_name)
    }

    fn close(&mut self) -> Result<bool> {
        self.handler.close()
    }

    fn read(&mut self, id: &str) -> Result<String> {
        self.handler.read(id)
    }

    fn write(&mut self, id: &str, data: &str) -> Result<bool> {
        self.handler.write(id, data)
    }

    fn destroy(&mut self, id: &str) -> Result<bool> {
        self.handler.destroy(id)
    }

    fn gc(&mut self, expires: Option<i64>) -> Result<bool> {
        self.handler.gc(expires)
    }
}
