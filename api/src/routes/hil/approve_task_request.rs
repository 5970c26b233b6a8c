use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
pub struct ApproveTaskRequest {
    pub notes: Option<String>,
    pub edited_message: Option<String>,
}
