mod json_store;
mod ledger;

pub use json_store::{validate_key, Document, JsonStore};
pub use ledger::Ledger;
