//! Authentication and progressive-setup gate for the job tracker web application.

pub mod api;
pub mod auth;
pub mod db;
pub mod gate;
pub mod provisioning;
