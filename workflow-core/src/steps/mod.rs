//! One module per conversation step (§4.6). Each exposes a free
//! `pub async fn handle(ctx: &mut StepContext<'_>, msg: &InboundMessage) -> StepResult`
//! instead of an `impl StepHandler` object — the orchestrator dispatches by
//! matching on `Step` directly, same house style as `event-llm`'s
//! enum-dispatch adapters (no `Box<dyn>`, no `async-trait`).

pub mod support;

pub mod step1_intake;
pub mod step2_date_confirmation;
pub mod step3_room_availability;
pub mod step4_offer_preparation;
pub mod step5_negotiation_close;
pub mod step6_transition_checkpoint;
pub mod step7_event_confirmation;
