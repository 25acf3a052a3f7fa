//! Domain model: value objects, entities, the risk policy and the ports the
//! application layer talks to.

pub mod finance_request;
pub mod ids;
pub mod money;
pub mod party;
pub mod policy;
pub mod ports;
pub mod scoring;
