pub mod dodge;
pub mod ids;
pub mod service;
pub mod store;
pub mod valentine;

pub use ids::{is_valid_id, IdError, ResultToken, SenderToken, ValentineId};
pub use service::{
    classify_visitor, create_valentine, fetch_result, fetch_valentine, submit_answer,
    CreatedValentine, ServiceError, Visitor,
};
pub use store::{EventRow, RecordStore, StoreError};
pub use valentine::{
    answer_url, result_url, Answer, NewValentine, ResultView, Status, Valentine,
    ANSWER_PATH_PREFIX, RESULT_PATH_PREFIX,
};
