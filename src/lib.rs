//! Webrecon - Web Server Reconnaissance Orchestrator
//!
//! This library wraps the standard web server reconnaissance toolchain (nmap,
//! sslscan, sslyze, nikto, dig) behind one catalog of scan tasks: it probes
//! the environment, resolves missing tools, runs each scanner with a bounded
//! time budget, allocates collision-free artifact names, and converts XML
//! output into HTML reports.
//!
//! # Warning
//! This tool is designed for authorized security assessment purposes only.
//! Users are responsible for ensuring they have proper permission before
//! scanning any domains or systems.

pub mod artifacts;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod convert;
pub mod deps;
pub mod display;
pub mod environment;
pub mod error;
pub mod executor;
pub mod session;
pub mod tasks;
pub mod utils;

pub use error::{Result, ScanError};
