//! cxhook core library — Dialogflow CX webhook fulfillment handlers,
//! wire types, configuration, geocoding client, and the HTTP gateway
//! used by the `cxhook` CLI.

pub mod config;
pub mod gateway;
pub mod geocoding;
pub mod webhook;
