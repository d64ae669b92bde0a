pub mod betsapi_client;
pub mod match_formatter;
pub mod match_store;
pub mod reconciler;
pub mod sync_observer;
pub mod sync_orchestrator;

#[cfg(test)]
pub(crate) mod testing;
