use serde::Serialize;

/// Shared response shape for both HIL decisions (spec §6): `approve_task`
/// populates `assistant_reply`/`thread_id` whenever the approved draft was
/// released to the client; `reject_task` only ever reports `review_state`.
#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assistant_reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    pub review_state: &'static str,
}
