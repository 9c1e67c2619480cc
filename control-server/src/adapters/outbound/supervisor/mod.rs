mod pm2;

pub use pm2::Pm2Supervisor;
