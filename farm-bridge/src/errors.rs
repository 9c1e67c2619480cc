use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Serialization Error: {0}")]
    Serde(#[from] rmp_serde::encode::Error),

    #[error("Deserialization Error: {0}")]
    DeSerde(#[from] rmp_serde::decode::Error),

    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),
}
