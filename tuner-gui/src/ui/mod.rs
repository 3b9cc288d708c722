//! # UI Module
//!
//! This module contains all UI components for the tuner.

pub mod gauge;
pub mod main_display;
