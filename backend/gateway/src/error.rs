use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Gateway unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Gateway unavailable: {0}")]
    Unavailable(String),

    #[error("Gateway rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Gateway refused credentials")]
    Unauthorized,

    #[error("Malformed gateway payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid gateway url: {0}")]
    Url(#[from] url::ParseError),

    #[error("Invalid header value for {0}")]
    InvalidHeader(&'static str),

    #[error("No stored row for {}, nothing was written for them", .0.join(", "))]
    Unwritten(Vec<String>),
}

impl GatewayError {
    pub fn rejected(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Rejected {
            status: status.as_u16(),
            message: message.into(),
        }
    }

    /// The gateway answered and refused the request, as opposed to never answering.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. } | Self::Unauthorized)
    }
}
