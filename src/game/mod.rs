pub mod constants;
pub mod engine;
pub mod estimator;
pub mod exploration;
pub mod performance;
pub mod state;
pub mod strategy;
pub mod systems;
pub mod turn_data;
