//! gemini-gateway: HTTP front end that forwards prompts and uploaded media to
//! the Gemini API.

pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
