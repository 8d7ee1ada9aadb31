//! Bot update handlers

pub mod callbacks;
pub mod commands;
pub mod messages;
