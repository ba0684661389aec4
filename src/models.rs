// src/models.rs

pub mod auth;
pub mod compliance;
pub mod dashboard;
pub mod farm;
pub mod finance;
pub mod logistics;
pub mod tenancy;
pub mod traceability;
