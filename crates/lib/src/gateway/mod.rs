//! Gateway: the HTTP surface of the fulfillment service.
//!
//! Single port, two routes: GET / for health probes and POST / for
//! Dialogflow CX webhook calls.

mod server;

pub use server::{run_gateway, GatewayState};
