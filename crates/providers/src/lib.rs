//! Answer generator implementations for the socialcare assistant.
//!
//! All generators implement the `socialcare_core::Generator` trait.
//! Exactly one generator is selected by configuration; there is no
//! fallback chain across backends.

pub mod gemini;
pub mod scripted;

pub use gemini::GeminiGenerator;
pub use scripted::ScriptedGenerator;

use socialcare_config::{AppConfig, ProviderKind};
use socialcare_core::{Error, Generator, Result};
use std::sync::Arc;

/// Build the generator selected by configuration.
///
/// Gemini requires an API key and fails here, at startup, without one.
pub fn build_generator(config: &AppConfig) -> Result<Arc<dyn Generator>> {
    match config.provider.kind {
        ProviderKind::Gemini => {
            let Some(api_key) = config.api_key.clone() else {
                return Err(Error::Config {
                    message: "Gemini requires an API key \
                              (set SOCIALCARE_API_KEY or api_key in config.toml)"
                        .into(),
                });
            };

            let mut generator = GeminiGenerator::new(&config.provider.model, api_key)
                .with_temperature(config.provider.temperature);
            if let Some(base_url) = &config.provider.base_url {
                generator = generator.with_base_url(base_url);
            }
            Ok(Arc::new(generator))
        }
        ProviderKind::Scripted => match &config.provider.scripted_reply {
            Some(reply) => Ok(Arc::new(ScriptedGenerator::with_reply(reply))),
            None => Ok(Arc::new(ScriptedGenerator::new())),
        },
    }
}
