//! Presentation layer: view models and compiled templates.

pub mod views;
