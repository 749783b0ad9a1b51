//! Figure composition and output.
//!
//! `figure` turns a sounding collection into a backend-independent
//! [`figure::Figure`]; `draw` paints it with plotters; `output` rasterises
//! it and writes the PNG.

pub mod draw;
pub mod figure;
pub mod output;
