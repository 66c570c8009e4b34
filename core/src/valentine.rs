use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::{ResultToken, SenderToken, ValentineId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Yes,
    No,
}

impl Status {
    pub fn is_pending(self) -> bool {
        matches!(self, Status::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Yes => "yes",
            Status::No => "no",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
}

impl Answer {
    pub fn status(self) -> Status {
        match self {
            Answer::Yes => Status::Yes,
            Answer::No => Status::No,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Answer::Yes => "yes",
            Answer::No => "no",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Valentine {
    pub id: ValentineId,
    pub sender_name: Option<String>,
    pub receiver_name: String,
    pub status: Status,
    pub created_at: String,
    pub answered_at: Option<String>,
    pub sender_token: SenderToken,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewValentine {
    pub id: ValentineId,
    pub sender_name: Option<String>,
    pub receiver_name: String,
    pub status: Status,
    pub sender_token: SenderToken,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultView {
    pub valentine_id: ValentineId,
    pub status: Status,
    pub created_at: String,
    pub answered_at: Option<String>,
}

pub const ANSWER_PATH_PREFIX: &str = "/v/";
pub const RESULT_PATH_PREFIX: &str = "/r/";

pub fn answer_url(origin: &str, id: &ValentineId) -> String {
    let origin = origin.trim_end_matches('/');
    format!("{origin}{ANSWER_PATH_PREFIX}{id}")
}

pub fn result_url(origin: &str, token: &ResultToken) -> String {
    let origin = origin.trim_end_matches('/');
    format!("{origin}{RESULT_PATH_PREFIX}{token}")
}
