// ── Execution orchestrator ──
//
// One pass per request: resolve the device, validate, select a transport,
// build the payload, make exactly one transport call, normalize. Holds no
// state between calls.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{Instrument, debug, error, info_span};
use uuid::Uuid;

use crate::command::CommandBuilder;
use crate::error::CoreError;
use crate::messages::Messages;
use crate::model::{
    Credential, DeviceConfig, ExecutionResult, Outcome, ProxyConfig, Query, Registry,
    TransportClass, status_code,
};
use crate::normalize::normalize;
use crate::selector;
use crate::transport::{Dispatch, Transport};
use crate::validate::Validator;

/// Runs a query to completion.
#[async_trait]
pub trait Execute: Send + Sync {
    /// Only an unknown location is an error; every other outcome is a result.
    async fn execute(&self, query: &Query) -> Result<ExecutionResult, CoreError>;
}

pub struct Orchestrator {
    registry: Arc<Registry>,
    validator: Arc<dyn Validator>,
    builder: Arc<dyn CommandBuilder>,
    scrape: Arc<dyn Transport>,
    rest: Arc<dyn Transport>,
    messages: Messages,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<Registry>,
        validator: Arc<dyn Validator>,
        builder: Arc<dyn CommandBuilder>,
        scrape: Arc<dyn Transport>,
        rest: Arc<dyn Transport>,
        messages: Messages,
    ) -> Self {
        Self {
            registry,
            validator,
            builder,
            scrape,
            rest,
            messages,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn transport(&self, class: TransportClass) -> &dyn Transport {
        match class {
            TransportClass::Scrape => self.scrape.as_ref(),
            TransportClass::Rest => self.rest.as_ref(),
        }
    }

    fn general_failure(&self) -> ExecutionResult {
        ExecutionResult::failed(&self.messages.general, status_code::INVALID)
    }

    /// Device credential plus, for proxied devices, the proxy and its own
    /// credential.
    fn credentials<'a>(
        &'a self,
        device: &DeviceConfig,
    ) -> Option<(&'a Credential, Option<(&'a ProxyConfig, &'a Credential)>)> {
        let credential = self.registry.credential(&device.credential)?;
        let proxy = match &device.proxy {
            Some(name) => {
                let proxy = self.registry.proxy(name)?;
                Some((proxy, self.registry.credential(&proxy.credential)?))
            }
            None => None,
        };
        Some((credential, proxy))
    }

    async fn run(&self, query: &Query) -> Result<ExecutionResult, CoreError> {
        let device = self
            .registry
            .device(query.location())
            .ok_or_else(|| CoreError::UnknownLocation {
                location: query.location().to_owned(),
            })?;
        let query_type = query.query_type();
        let target = query.target();

        if let Err(rejection) = self.validator.validate(device, query_type, target) {
            debug!(status = rejection.status_code, keywords = ?rejection.keywords, "query rejected");
            return Ok(ExecutionResult::rejected(
                rejection.message,
                rejection.status_code,
            ));
        }

        let class = selector::select(device.platform);
        let payload = match self.builder.build(device, class, query_type, target) {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, "command build failed");
                return Ok(self.general_failure());
            }
        };

        let Some((credential, proxy)) = self.credentials(device) else {
            error!(credential = %device.credential, proxy = ?device.proxy, "device references are unresolved");
            return Ok(self.general_failure());
        };

        let transport = self.transport(class);
        debug!(transport = %transport.class(), platform = %device.platform, proxied = proxy.is_some(), "dispatching");
        let mut result = transport
            .send(Dispatch {
                device,
                query_type,
                payload,
                credential,
                proxy,
            })
            .await;

        if result.outcome == Outcome::Succeeded {
            result.output = normalize(device.platform, query_type, &result.output);
        }
        debug!(outcome = %result.outcome, status = result.status_code, "query finished");
        Ok(result)
    }
}

#[async_trait]
impl Execute for Orchestrator {
    async fn execute(&self, query: &Query) -> Result<ExecutionResult, CoreError> {
        let span = info_span!(
            "query",
            request_id = %Uuid::new_v4(),
            location = query.location(),
            query_type = %query.query_type(),
        );
        self.run(query).instrument(span).await
    }
}
