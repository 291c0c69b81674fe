//! Infographics - chart infographics from CSV files and webpage tables
//!
//! Loads a table, picks suitable charts for it and renders them as PNG files.

pub mod charts;
pub mod cli;
pub mod config;
pub mod data;
pub mod generator;
pub mod stats;
