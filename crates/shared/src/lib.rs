//! Shared types, errors, and configuration for Invoya.
//!
//! This crate provides common building blocks used across all other crates:
//! - Application-wide error types and the JSON error envelope
//! - Configuration management
//! - JWT claims and token service
//! - SMTP email delivery with correlation IDs
//! - Payment provider client (hosted checkout sessions)

pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod jwt;
pub mod payments;

pub use auth::Claims;
pub use config::AppConfig;
pub use email::{EmailError, EmailService};
pub use error::{AppError, AppResult};
pub use jwt::{JwtError, JwtService};
pub use payments::{CheckoutSession, PaymentsClient, PaymentsError};
