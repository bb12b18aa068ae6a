// src/market/mod.rs
pub mod rates;
pub mod volatility_surface;

pub use rates::RateCurve;
pub use volatility_surface::{FlatVolatility, VolatilityFn, VolatilitySurface};
