mod http_remote_call;

pub use http_remote_call::HttpRemoteCall;
