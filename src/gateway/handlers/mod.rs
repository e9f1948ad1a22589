//! HTTP request handlers, one module per route group

pub mod accounts;
pub mod auth;
pub mod health;
pub mod transactions;
