use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
pub struct RejectTaskRequest {
    pub notes: Option<String>,
}
