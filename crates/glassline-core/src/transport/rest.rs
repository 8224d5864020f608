// REST transport: POSTs the JSON payload to the device's query agent.

use async_trait::async_trait;
use glassline_api::{RestClient, rest};
use tracing::{debug, error};

use super::{Dispatch, Transport};
use crate::command::Payload;
use crate::error::CoreError;
use crate::model::{ExecutionResult, TransportClass, status_code};

pub struct RestTransport {
    client: RestClient,
    general_error: String,
}

impl RestTransport {
    pub fn new(client: RestClient, general_error: impl Into<String>) -> Self {
        Self {
            client,
            general_error: general_error.into(),
        }
    }

    async fn run(&self, request: &Dispatch<'_>) -> Result<ExecutionResult, CoreError> {
        let device = request.device;
        let build_error = |message: &str| CoreError::Build {
            platform: device.platform,
            query_type: request.query_type,
            message: message.into(),
        };

        let Payload::Json(body) = &request.payload else {
            return Err(build_error("rest transport needs a json payload"));
        };
        let path = device
            .platform
            .rest_path()
            .ok_or_else(|| build_error("platform has no query agent endpoint"))?;

        let fault = |e: glassline_api::Error| CoreError::connect_failure(TransportClass::Rest, &e);
        let url = rest::endpoint(&device.address, device.port, path).map_err(fault)?;
        debug!(location = %device.location, %url, "posting to query agent");

        let response = self
            .client
            .post(url, &request.credential.secret, body)
            .await
            .map_err(fault)?;
        debug!(location = %device.location, status = response.status, "agent responded");

        Ok(ExecutionResult::from_response(response.status, response.body))
    }
}

#[async_trait]
impl Transport for RestTransport {
    fn class(&self) -> TransportClass {
        TransportClass::Rest
    }

    async fn send(&self, request: Dispatch<'_>) -> ExecutionResult {
        match self.run(&request).await {
            Ok(result) => result,
            Err(e) => {
                error!(location = %request.device.location, error = %e, "rest query failed");
                ExecutionResult::failed(&self.general_error, status_code::INVALID)
            }
        }
    }
}
