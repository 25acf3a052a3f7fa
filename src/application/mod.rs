//! Application layer orchestrating the domain against the storage ports.
//!
//! `DecisionEngine` prices an application from the SME's latest credit score.
//! `FinanceService` is the entry point callers use: it validates inputs, persists
//! new requests and drives every lifecycle transition through an atomic
//! compare-and-swap on the request store.

pub mod decision;
pub mod service;
