//! Reading Error Types

use thiserror::Error;

use crate::flow::FlowStep;

/// Result type alias for reading operations
pub type Result<T> = std::result::Result<T, ReadingError>;

/// Errors raised by chart generation, analysis and the fulfillment flow
#[derive(Error, Debug)]
pub enum ReadingError {
    /// Malformed or out-of-range user input; always user-correctable
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// Comprehensive tier requested without a partner chart
    #[error("Partner birth chart is required for comprehensive analysis")]
    MissingPartnerData,

    /// A prior step's data is absent from the flow store; routes the user
    /// backward rather than surfacing an error page
    #[error("Missing data for step: {0}")]
    MissingPrecondition(FlowStep),

    /// Every model in the completion fallback chain failed
    #[error("AI analysis service unavailable: {0}")]
    CompletionUnavailable(String),

    /// The flow reached its terminal failure state
    #[error("Flow aborted: {0}")]
    Aborted(String),

    /// Flow store failure
    #[error("Flow state error: {0}")]
    State(String),

    /// Payment subsystem error
    #[error(transparent)]
    Payment(#[from] astro_payments::PaymentError),

    /// Completion subsystem error
    #[error(transparent)]
    Core(#[from] astro_core::CoreError),
}

impl ReadingError {
    /// Shorthand for a field-level validation failure
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ReadingError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// The earliest flow step that can repair this error, if routing
    /// backward is the right reaction
    pub fn route_back(&self) -> Option<FlowStep> {
        match self {
            ReadingError::MissingPrecondition(step) => Some(*step),
            ReadingError::MissingPartnerData
            | ReadingError::CompletionUnavailable(_)
            | ReadingError::Aborted(_) => Some(FlowStep::BirthForm),
            _ => None,
        }
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            ReadingError::Validation { field, message } => format!("{field}: {message}"),
            ReadingError::MissingPartnerData => {
                "Partner birth details are required for the comprehensive reading.".into()
            }
            ReadingError::MissingPrecondition(step) => {
                format!("Please complete the {step} step first.")
            }
            ReadingError::CompletionUnavailable(_) => "AI service temporarily unavailable".into(),
            ReadingError::Aborted(reason) => reason.clone(),
            ReadingError::Payment(e) => e.user_message().into(),
            ReadingError::Core(e) => e.user_message(),
            ReadingError::State(_) => "An unexpected error occurred.".into(),
        }
    }
}
