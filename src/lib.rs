//! veo-scene library crate.
//!
//! Generates a short video scene from a text prompt and a reference image
//! with Google's Veo model, and renders it as a self-contained player page.

pub mod cli;
pub mod config;
pub mod player;
pub mod scene;
pub mod veo;
