/// Typed request helpers on top of [`MessageBus::request`]
use crate::response::{DataResponse, ServiceResponse};
use crate::{BusError, MessageBus};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error(transparent)]
    Bus(#[from] BusError),

    #[error("{subject} failed with {code}: {msg}")]
    Failure {
        subject: String,
        code: u16,
        msg: String,
    },

    #[error("invalid reply from {subject}: {source}")]
    InvalidReply {
        subject: String,
        source: serde_json::Error,
    },

    #[error("cannot encode request for {subject}: {source}")]
    InvalidRequest {
        subject: String,
        source: serde_json::Error,
    },
}

impl RequestError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RequestError::Bus(e) if e.is_timeout())
    }

    /// Status code of an explicit failure reply
    pub fn failure_code(&self) -> Option<u16> {
        match self {
            RequestError::Failure { code, .. } => Some(*code),
            _ => None,
        }
    }

    fn failure(subject: &str, status: ServiceResponse) -> Self {
        RequestError::Failure {
            subject: subject.to_string(),
            code: status.code,
            msg: status.msg,
        }
    }
}

async fn send<T: Serialize + ?Sized>(
    bus: &dyn MessageBus,
    subject: &str,
    payload: &T,
    timeout: Duration,
) -> Result<Bytes, RequestError> {
    let body = serde_json::to_vec(payload).map_err(|source| RequestError::InvalidRequest {
        subject: subject.to_string(),
        source,
    })?;

    Ok(bus.request(subject, Bytes::from(body), timeout).await?)
}

/// Send a command and require a success [`ServiceResponse`]
pub async fn request_command<T: Serialize + ?Sized>(
    bus: &dyn MessageBus,
    subject: &str,
    payload: &T,
    timeout: Duration,
) -> Result<ServiceResponse, RequestError> {
    let reply = send(bus, subject, payload, timeout).await?;

    let response: ServiceResponse =
        serde_json::from_slice(&reply).map_err(|source| RequestError::InvalidReply {
            subject: subject.to_string(),
            source,
        })?;

    if !response.is_success() {
        warn!(subject = %subject, code = response.code, msg = %response.msg, "Command failed");
        return Err(RequestError::failure(subject, response));
    }

    Ok(response)
}

/// Send a query and decode the data of a success [`DataResponse`]
pub async fn request_data<T, R>(
    bus: &dyn MessageBus,
    subject: &str,
    payload: &T,
    timeout: Duration,
) -> Result<R, RequestError>
where
    T: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let reply = send(bus, subject, payload, timeout).await?;

    let response: DataResponse<R> =
        serde_json::from_slice(&reply).map_err(|source| RequestError::InvalidReply {
            subject: subject.to_string(),
            source,
        })?;

    response
        .into_result()
        .map_err(|status| RequestError::failure(subject, status))
}
