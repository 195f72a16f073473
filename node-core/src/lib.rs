#![no_std]
#![allow(async_fn_in_trait)]

// Portable core of the sensor node: runtime configuration, the REST
// semantics of the config endpoint, link/session supervision and the
// per-tick telemetry coordinator. Hardware and transports stay behind
// traits so this crate builds and tests on the host.

pub mod config;
pub mod coordinator;
pub mod link;
pub mod payload;
pub mod rest;
pub mod sampler;
pub mod session;
pub mod topics;
