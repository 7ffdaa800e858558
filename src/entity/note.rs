// src/entity/note.rs
use serde::{Deserialize, Serialize};

use super::{Record, RecordId};
use crate::photo::EncodedImage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: RecordId,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub image: Option<EncodedImage>,
}

impl Note {
    /// A fresh note: empty text, no photo.
    pub fn new(id: RecordId) -> Self {
        Self {
            id,
            text: String::new(),
            image: None,
        }
    }

    pub fn with_text(&self, text: String) -> Self {
        Self {
            text,
            ..self.clone()
        }
    }

    pub fn with_image(&self, image: Option<EncodedImage>) -> Self {
        Self {
            image,
            ..self.clone()
        }
    }
}

impl Record for Note {
    const KIND: &'static str = "note";

    fn id(&self) -> RecordId {
        self.id
    }
}
