//! Deployment transaction construction: authorization, building, gas estimation

mod auth;
mod deploy;
mod gas;

pub use auth::TransactOpts;
pub use deploy::{Deployer, DeploymentTx, SignedDeployment};
pub use gas::{GasEstimate, GasEstimator};
