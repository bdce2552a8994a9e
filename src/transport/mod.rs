pub mod gateway;
pub mod payload;
pub mod stdio;

pub use payload::{ClusterRequest, Contract, RankRequest, parse_request, respond};
