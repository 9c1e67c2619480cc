use serde::{Deserialize, Serialize};

/// Entry of the supervisor's process list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub name: String,
    pub pid: Option<u32>,
}

/// Launch parameters for a process that is not yet supervised
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartSpec {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    pub cwd: Option<String>,
}
