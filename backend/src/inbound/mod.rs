//! Inbound adapters. HTTP is the only transport; handlers resolve the caller
//! and delegate to the driving ports.

pub mod http;
