//! HTTP handlers

pub mod health;
pub mod evaluate;
pub mod events;
pub mod rules;
