//! Threadline storefront library.
//!
//! The storefront exposes a JSON API over a product catalog and a shopping
//! cart. Guests keep their cart in the session; signed-in shoppers keep it
//! in `PostgreSQL`. The library split lets the services be tested against
//! in-memory stores.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod validation;
