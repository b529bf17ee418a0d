//! Inquest Library
//!
//! Core components for the compliance investigation boundary layer: the
//! path-routing reverse proxy gateway and the streaming investigation
//! agent service.

pub mod agent;
pub mod api;
pub mod customers;
pub mod diag;
pub mod proxy;
pub mod regulations;
