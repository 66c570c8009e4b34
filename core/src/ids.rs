use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const ID_LEN: usize = 36;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    InvalidLength { expected: usize, found: usize },
    NotCanonical,
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdError::InvalidLength { expected, found } => {
                write!(f, "id must be {expected} chars, got {found}")
            }
            IdError::NotCanonical => write!(f, "id is not a canonical lowercase uuid"),
        }
    }
}

impl std::error::Error for IdError {}

fn parse_canonical(value: &str) -> Result<Uuid, IdError> {
    if value.len() != ID_LEN {
        return Err(IdError::InvalidLength {
            expected: ID_LEN,
            found: value.len(),
        });
    }
    let uuid = Uuid::try_parse(value).map_err(|_| IdError::NotCanonical)?;
    if value != uuid.as_hyphenated().to_string() {
        return Err(IdError::NotCanonical);
    }
    Ok(uuid)
}

pub fn is_valid_id(value: &str) -> bool {
    parse_canonical(value).is_ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValentineId(Uuid);

impl ValentineId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(value: &str) -> Result<Self, IdError> {
        parse_canonical(value).map(Self)
    }
}

impl fmt::Display for ValentineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.as_hyphenated().fmt(f)
    }
}

impl std::str::FromStr for ValentineId {
    type Err = IdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultToken(Uuid);

impl ResultToken {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(value: &str) -> Result<Self, IdError> {
        parse_canonical(value).map(Self)
    }
}

impl fmt::Display for ResultToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.as_hyphenated().fmt(f)
    }
}

impl std::str::FromStr for ResultToken {
    type Err = IdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SenderToken(Uuid);

impl SenderToken {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(value: &str) -> Result<Self, IdError> {
        parse_canonical(value).map(Self)
    }
}

impl fmt::Display for SenderToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.as_hyphenated().fmt(f)
    }
}

impl std::str::FromStr for SenderToken {
    type Err = IdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}
