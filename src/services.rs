// src/services.rs

pub mod auth;
pub mod compliance_service;
pub mod dashboard_service;
pub mod finance_service;
pub mod land_service;
pub mod logistics_service;
pub mod notification_service;
pub mod team_service;
pub mod tenancy_service;
pub mod traceability_service;
