use barentain_core::{ServiceError, StoreError};

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum PageError {
    Validation(String),
    NotFound,
    AccessDenied,
    Transient,
}

impl PageError {
    pub(crate) fn title(&self) -> &'static str {
        match self {
            PageError::Validation(_) => "That didn't work",
            PageError::NotFound => "Link not found",
            PageError::AccessDenied => "Not allowed",
            PageError::Transient => "Something went wrong",
        }
    }

    pub(crate) fn message(&self) -> String {
        match self {
            PageError::Validation(message) => message.clone(),
            PageError::NotFound => "This link is invalid or has expired.".to_string(),
            PageError::AccessDenied => {
                "This page belongs to someone else's Valentine.".to_string()
            }
            PageError::Transient => "Please try again in a moment.".to_string(),
        }
    }
}

impl From<ServiceError> for PageError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(message) => PageError::Validation(message),
            ServiceError::Store(StoreError::NotFound) => PageError::NotFound,
            ServiceError::Store(StoreError::Invalid(_)) => PageError::Transient,
            ServiceError::Store(StoreError::Transient(_)) => PageError::Transient,
        }
    }
}
