pub mod backdrop;
pub mod calibration;
pub mod camera;
pub mod config;
pub mod pipeline;
pub mod pose;
pub mod render;
pub mod tracker;
