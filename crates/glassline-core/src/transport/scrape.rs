// SSH scrape transport: renders the dispatch into a raw scrape call and
// folds every fault into the generic failure.

use async_trait::async_trait;
use glassline_api::{Connector, Login, ProxyHop, ScrapeClient, SessionTarget, SshConnector};
use tracing::{debug, error};

use super::{Dispatch, Transport};
use crate::command::Payload;
use crate::error::CoreError;
use crate::model::{Credential, ExecutionResult, ProxyConfig, TransportClass, status_code};

pub struct ScrapeTransport<C: Connector = SshConnector> {
    client: ScrapeClient<C>,
    general_error: String,
}

impl<C: Connector> ScrapeTransport<C> {
    /// `general_error` is the only text callers see when a call fails.
    pub fn new(client: ScrapeClient<C>, general_error: impl Into<String>) -> Self {
        Self {
            client,
            general_error: general_error.into(),
        }
    }

    async fn run(&self, request: &Dispatch<'_>) -> Result<String, CoreError> {
        let Payload::Command(command) = &request.payload else {
            return Err(CoreError::Build {
                platform: request.device.platform,
                query_type: request.query_type,
                message: "scrape transport needs a command payload".into(),
            });
        };

        let device = request.device;
        let target = SessionTarget {
            host: device.address.clone(),
            port: device.port,
            device_type: device.platform.to_string(),
        };
        let login = login(request.credential);
        let proxy = request.proxy.map(|(proxy, cred)| hop(proxy, cred));

        let output = self
            .client
            .send_command(&target, &login, proxy.as_ref(), command)
            .await
            .map_err(|e| CoreError::connect_failure(TransportClass::Scrape, &e))?;

        if output.trim().is_empty() {
            return Err(CoreError::ConnectFailure {
                transport: TransportClass::Scrape,
                cause: "no response".into(),
            });
        }
        debug!(location = %device.location, query_type = %request.query_type, bytes = output.len(), "scrape output received");
        Ok(output)
    }
}

#[async_trait]
impl<C: Connector> Transport for ScrapeTransport<C> {
    fn class(&self) -> TransportClass {
        TransportClass::Scrape
    }

    async fn send(&self, request: Dispatch<'_>) -> ExecutionResult {
        match self.run(&request).await {
            Ok(output) => ExecutionResult::succeeded(output),
            Err(e) => {
                error!(location = %request.device.location, error = %e, "scrape query failed");
                ExecutionResult::failed(&self.general_error, status_code::INVALID)
            }
        }
    }
}

fn login(credential: &Credential) -> Login {
    Login {
        username: credential.username.clone(),
        password: credential.secret.clone(),
    }
}

fn hop(proxy: &ProxyConfig, credential: &Credential) -> ProxyHop {
    ProxyHop {
        name: proxy.name.clone(),
        host: proxy.address.clone(),
        port: proxy.port,
        login: login(credential),
    }
}
