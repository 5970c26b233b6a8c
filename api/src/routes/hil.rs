pub mod approve_task_request;
pub mod approve_task_route;
pub mod list_tasks_route;
pub mod reject_task_request;
pub mod reject_task_route;
pub mod review_response;
