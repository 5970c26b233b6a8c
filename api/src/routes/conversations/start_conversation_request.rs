use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct StartConversationRequest {
    pub client_email: String,
    pub body: String,
}
