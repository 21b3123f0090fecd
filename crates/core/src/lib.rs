//! Core business logic for Invoya.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `auth` - Password hashing
//! - `invoice` - Totals, numbering, and the status lifecycle
//! - `pdf` - Invoice PDF rendering
//! - `webhook` - Provider webhook signatures and event payloads

pub mod auth;
pub mod invoice;
pub mod pdf;
pub mod webhook;
