use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use stars_engine::{
    db_types::{ProductId, Stars},
    helpers::ValidationError,
    CatalogError,
    LedgerError,
    PurchaseFlowError,
};
use telegram_tools::TelegramApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("The webhook secret is missing or incorrect")]
    Forbidden,
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

/// Why an inbound event could not be handled. Each variant maps to exactly one notice for the user.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("Insufficient funds. The balance is {balance}, but {required} is required")]
    InsufficientFunds { balance: Stars, required: Stars },
    #[error("Product {0} does not exist")]
    NotFound(ProductId),
    #[error("The user is not an administrator")]
    Unauthorized,
    #[error("Could not update the record store. {0}")]
    Persistence(String),
    #[error("The action no longer applies")]
    StaleAction,
    #[error("Could not exchange data with the transport. {0}")]
    Transfer(String),
}

impl DispatchError {
    /// The text shown to the user. `support` is the support contact.
    pub fn user_message(&self, support: &str) -> String {
        match self {
            Self::Validation(ValidationError::BelowMinimum { minimum, .. }) => {
                format!("❌ The minimum amount is {minimum}. Please enter a larger amount.")
            },
            Self::Validation(ValidationError::MissingValue("file")) => {
                "❌ Please send the product file as a document.".to_string()
            },
            Self::Validation(ValidationError::MissingValue(what)) => format!("❌ Please enter the {what}."),
            Self::Validation(ValidationError::TooLarge(_)) => {
                "❌ That amount is too large for the balance. Please enter a smaller amount.".to_string()
            },
            Self::Validation(_) => "❌ Please enter a positive whole number.".to_string(),
            Self::InsufficientFunds { balance, required } => {
                format!("❌ Not enough stars. The price is {required} but your balance is {balance}.")
            },
            Self::NotFound(_) => "❌ That product is no longer available.".to_string(),
            Self::Unauthorized => "⛔ This action is only available to administrators.".to_string(),
            Self::Persistence(_) => format!("⚠️ Something went wrong. Please try again or contact {support}."),
            Self::StaleAction => "This menu has expired. Please start again.".to_string(),
            Self::Transfer(_) => "⚠️ Could not reach the chat service. Please try again.".to_string(),
        }
    }
}

impl From<LedgerError> for DispatchError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InsufficientFunds { balance, required } => Self::InsufficientFunds { balance, required },
            LedgerError::InvalidAmount(amount) => Self::Validation(ValidationError::NotPositive(amount.value())),
            LedgerError::Overflow(amount) => Self::Validation(ValidationError::TooLarge(amount)),
            LedgerError::DatabaseError(s) => Self::Persistence(s),
        }
    }
}

impl From<CatalogError> for DispatchError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::ProductNotFound(id) => Self::NotFound(id),
            CatalogError::InvalidPrice(price) => Self::Validation(ValidationError::NotPositive(price.value())),
            CatalogError::DatabaseError(s) => Self::Persistence(s),
            CatalogError::AssetError(s) => Self::Persistence(s),
        }
    }
}

impl From<PurchaseFlowError> for DispatchError {
    fn from(e: PurchaseFlowError) -> Self {
        match e {
            PurchaseFlowError::DatabaseError(s) => Self::Persistence(s),
            PurchaseFlowError::ProductNotFound(id) => Self::NotFound(id),
            PurchaseFlowError::InsufficientFunds { balance, required } => {
                Self::InsufficientFunds { balance, required }
            },
            PurchaseFlowError::Validation(v) => Self::Validation(v),
        }
    }
}

/// A message or file could not be delivered through the transport.
#[derive(Debug, Clone, Error)]
#[error("Delivery failed. {0}")]
pub struct DeliveryError(pub String);

impl From<TelegramApiError> for DeliveryError {
    fn from(e: TelegramApiError) -> Self {
        Self(e.to_string())
    }
}

impl From<DeliveryError> for DispatchError {
    fn from(e: DeliveryError) -> Self {
        Self::Transfer(e.0)
    }
}
