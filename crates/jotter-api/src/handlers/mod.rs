//! HTTP handlers for jotter-api.

pub mod ai;
pub mod api_keys;
pub mod auth;
pub mod health;
pub mod labels;
pub mod logs;
pub mod notes;
