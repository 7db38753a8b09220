//! Report rendering.

pub mod charts;
pub mod generator;

pub use charts::{write_chart_assets, ChartAssets};
pub use generator::*;
