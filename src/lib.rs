pub mod core;
pub mod rpc;
