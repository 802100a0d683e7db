//! Webhook fulfillment: wire types, tag dispatch, and per-tag handlers.
//!
//! Each invocation is a pure function of the request body (plus the wall
//! clock for billing dates and the injected allow-lists); nothing is cached
//! across requests and no request reads state written by another.

mod anomaly;
mod coverage;
mod dispatch;
mod geocode;
mod phone_line;
mod plan;
pub mod protocol;

pub use dispatch::{fulfill, Tag};
pub use geocode::GeocodeHandlerError;
