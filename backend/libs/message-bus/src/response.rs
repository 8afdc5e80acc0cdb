//! Reply envelopes
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Outcome of a command: an HTTP-like status code and a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceResponse {
    pub code: u16,
    pub msg: String,
}

impl ServiceResponse {
    pub fn ok(msg: impl Into<String>) -> Self {
        Self {
            code: 200,
            msg: msg.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            code: 404,
            msg: msg.into(),
        }
    }

    pub fn failure(msg: impl Into<String>) -> Self {
        Self {
            code: 500,
            msg: msg.into(),
        }
    }

    /// A downstream call ran out of time
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self {
            code: 504,
            msg: msg.into(),
        }
    }

    /// Any code in 200..300
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }

    pub fn to_bytes(&self) -> Bytes {
        Bytes::from(serde_json::to_vec(self).unwrap_or_default())
    }
}

/// Outcome of a query: status plus the data on success
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub code: u16,
    pub msg: String,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

impl<T> DataResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            code: 200,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    pub fn status(&self) -> ServiceResponse {
        ServiceResponse {
            code: self.code,
            msg: self.msg.clone(),
        }
    }

    /// Data on success, the status otherwise. A success without data is
    /// reported as a failure.
    pub fn into_result(self) -> Result<T, ServiceResponse> {
        let status = self.status();
        if !status.is_success() {
            return Err(status);
        }
        self.data
            .ok_or_else(|| ServiceResponse::failure("reply carried no data"))
    }
}

impl<T> From<ServiceResponse> for DataResponse<T> {
    fn from(status: ServiceResponse) -> Self {
        Self {
            code: status.code,
            msg: status.msg,
            data: None,
        }
    }
}

impl<T: Serialize> DataResponse<T> {
    pub fn to_bytes(&self) -> Bytes {
        match serde_json::to_vec(self) {
            Ok(bytes) => Bytes::from(bytes),
            Err(e) => ServiceResponse::failure(format!("cannot encode reply: {e}")).to_bytes(),
        }
    }
}
