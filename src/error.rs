use thiserror::Error;

#[derive(Error, Debug)]
pub enum TripbookError {
    #[error("Not in a tripbook project. Run 'tripbook init' first.")]
    NotInitialized,

    #[error("Already initialized. Remove .tripbook/ to reinitialize.")]
    AlreadyInitialized,

    #[error("Corrupt persisted data under '{key}': {reason}")]
    CorruptPersistedData { key: String, reason: String },

    #[error("Storage quota exceeded while saving '{key}': {needed} bytes needed, quota is {quota}")]
    StorageQuotaExceeded { key: String, needed: u64, quota: u64 },

    #[error("Image could not be decoded: {0}")]
    ImageDecode(String),

    #[error("Image could not be encoded: {0}")]
    ImageEncode(String),

    #[error("Invalid expense: {0}")]
    InvalidExpenseInput(String),

    #[error("Invalid exchange rate: {0}")]
    InvalidRate(String),

    #[error("Day {day} is outside the itinerary ({day_count} days)")]
    InvalidDay { day: u32, day_count: u32 },

    #[error("No {kind} with id {id} on day {day}")]
    RecordNotFound { kind: &'static str, id: u64, day: u32 },

    #[error("No record ids left after {last_id}")]
    IdsExhausted { last_id: u64 },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, TripbookError>;
