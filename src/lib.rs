//! Reconciles Windows Autopilot, Intune and Entra device inventories from
//! Microsoft Graph and renders them as a self-contained interactive report.

pub mod cmd;
pub mod config;
pub mod error;
pub mod graph;
pub mod inventory;
pub mod report;
