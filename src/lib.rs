//! battle-web: page shell and battle controllers for real-time agent battles.

pub mod agent;
pub mod app_config;
pub mod battle;
pub mod cli;
pub mod config;
pub mod logging;
pub mod rehearse;
pub mod session;
pub mod web;
