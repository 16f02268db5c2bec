//! Library crate for gateway-probe: interface detection, gateway guessing,
//! port/banner probing and the simulated unlock workflow.
pub mod error;
pub mod netdetect;
pub mod ports;
pub mod prober;
pub mod report;
pub mod types;
pub mod unlock;
