// src/interpolation/mod.rs
pub mod cubic;
pub mod interpolation_2d;

pub use cubic::CubicSpline;
pub use interpolation_2d::Interpolation2D;
