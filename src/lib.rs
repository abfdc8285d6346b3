//! Interactive linear algebra and vector calculus lab.
//!
//! The numeric core (`math`, `camera`, `interaction`, `sim`) has no
//! dependency on a running window; `app` and `lessons` wire it into egui.

pub mod app;
pub mod camera;
pub mod config;
pub mod error;
pub mod interaction;
pub mod lessons;
pub mod math;
pub mod render;
pub mod scene;
pub mod sim;
pub mod ui;
