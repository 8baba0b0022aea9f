//! Integration tests for the Folio editing backend

mod test_utils;

mod gateway_integration;
mod store_integration;
mod sync_workflows;
