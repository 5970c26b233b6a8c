pub mod conversations;
pub mod health_route;
pub mod hil;
