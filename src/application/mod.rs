//! Application Layer
//!
//! Business logic services, the real-time relay and data transfer objects
//! (DTOs). This layer orchestrates the flow of data between the presentation
//! and domain layers.

pub mod dto;
pub mod relay;
pub mod services;
