use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("could not understand the requested operation")]
    UnrecognizedOperation,
    #[error("missing required field for {operation}: {fields}")]
    MissingRequiredField { operation: &'static str, fields: &'static str },
}

impl DomainError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::UnrecognizedOperation => "unrecognized_operation",
            Self::MissingRequiredField { .. } => "missing_required_field",
        }
    }
}
