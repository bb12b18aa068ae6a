pub mod gbm;
pub mod local_vol;
pub mod model;

pub use gbm::Gbm;
pub use local_vol::LocalVolatilityModel;
pub use model::SdeModel;
