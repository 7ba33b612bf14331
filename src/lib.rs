pub mod app;
pub mod canvas;
pub mod capture;
pub mod config;
pub mod detector;
pub mod expression;
pub mod painter;
pub mod palette;
pub mod render;
pub mod sampler;
pub mod stroke;
pub mod terminal;

mod font;
