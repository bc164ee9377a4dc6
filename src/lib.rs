//! Chocolate sales analytics.
//!
//! The [`data`] module is the whole pipeline: load a sales file, normalize
//! its cells, filter by country / product / date and aggregate the result.
//! The `choco-dash` binary is an egui front end over it.

pub mod data;
