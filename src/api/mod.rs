pub mod client;

pub use client::*;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{CreatedPersona, PersonaPayload};

/// The downstream persona-generation service.
///
/// `index` is the 0-based position of the record within its file.
#[async_trait]
pub trait PersonaGenerator: Send + Sync {
    async fn generate(&self, payload: &PersonaPayload, index: usize) -> Result<Vec<CreatedPersona>>;
}
