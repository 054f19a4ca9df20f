// Career path planning.
// Form Collector (form, upload) -> Plan Relay (relay, prompts) -> completion service.
// All LLM calls go through llm_client::CompletionService.

pub mod export;
pub mod form;
pub mod handlers;
pub mod models;
pub mod prompts;
pub mod relay;
pub mod upload;
