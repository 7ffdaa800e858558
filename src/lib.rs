pub mod cli;
pub mod config;
pub mod currency;
pub mod entity;
pub mod error;
pub mod itinerary;
pub mod journal;
pub mod photo;
pub mod storage;
pub mod warnings;

pub use config::JournalConfig;
pub use currency::{compute_total, ExchangeRate, Totals};
pub use error::{Result, TripbookError};
pub use journal::Journal;
