pub mod accept_route;
pub mod confirm_date_request;
pub mod confirm_date_route;
pub mod reject_route;
pub mod send_message_request;
pub mod send_message_route;
pub mod start_conversation_request;
pub mod start_conversation_route;
