pub mod rpc;
pub mod supervisor;

pub use rpc::HttpRemoteCall;
pub use supervisor::Pm2Supervisor;
