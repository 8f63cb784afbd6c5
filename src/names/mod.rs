//! Name service collaborators
//!
//! Thin wrappers over the registry's lookup API and the external
//! candidate-name generator. Business logic stays in the registrar; this
//! module only speaks the wire formats.

use rand::Rng;
use serde_json::json;

use crate::chain::Session;
use crate::config::NamesConfig;
use crate::error::{RegistrarError, RegistrarResult};

pub struct NamesApi {
    config: NamesConfig,
}

impl NamesApi {
    pub fn new(config: NamesConfig) -> Self {
        Self { config }
    }

    /// Current primary name of an address, if one is set
    pub async fn primary_name(
        &self,
        session: &Session,
        address: &str,
    ) -> RegistrarResult<Option<String>> {
        let url = format!(
            "{}/primary-name/{}",
            self.config.api_url.trim_end_matches('/'),
            address
        );
        let body: serde_json::Value = session
            .http()
            .get(&url)
            .send()
            .await?
            .json()
            .await
            .map_err(|e| RegistrarError::Response(format!("malformed primary-name reply: {}", e)))?;

        Ok(body
            .get("name")
            .and_then(|name| name.as_str())
            .map(str::to_string))
    }

    /// Whether a name is still unregistered
    ///
    /// The registry answers an empty JSON object for free names.
    pub async fn is_available(&self, session: &Session, name: &str) -> RegistrarResult<bool> {
        let url = format!(
            "{}/address/{}",
            self.config.api_url.trim_end_matches('/'),
            name
        );
        let body = session.http().get(&url).send().await?.text().await?;
        Ok(body.trim() == "{}")
    }

    /// Find an available candidate name
    ///
    /// Draws random candidates from the generator, skipping ones below the
    /// minimum length and ones already taken; fetches a fresh batch whenever
    /// the current one runs dry.
    pub async fn find_available(&self, session: &Session) -> RegistrarResult<String> {
        let mut candidates = self.fetch_candidates(session).await?;

        loop {
            if candidates.is_empty() {
                candidates = self.fetch_candidates(session).await?;
                continue;
            }

            let index = rand::thread_rng().gen_range(0..candidates.len());
            let name = candidates.swap_remove(index).to_lowercase();
            if name.len() < self.config.min_name_len {
                continue;
            }
            if self.is_available(session, &name).await? {
                return Ok(name);
            }
        }
    }

    /// Fetch a batch of candidate names from the generator service
    async fn fetch_candidates(&self, session: &Session) -> RegistrarResult<Vec<String>> {
        let payload = json!({
            "snr": {
                "GenderAny": false,
                "GenderMale": false,
                "GenderFemale": false,
                "Hobbies": "",
                "LanguageCode": "en",
                "NamesLanguageID": "45",
                "Numbers": "",
                "OneWord": false,
                "Rhyming": false,
                "ScreenNameStyleString": "Any",
                "Stub": "username",
                "ThingsILike": "",
                "UseExactWords": false,
                "UserName": "",
                "WhatAreYouLike": "",
                "Words": "",
                "category": 0,
            }
        });

        let body: serde_json::Value = session
            .http()
            .post(&self.config.generator_url)
            .json(&payload)
            .send()
            .await?
            .json()
            .await
            .map_err(|e| RegistrarError::Response(format!("malformed generator reply: {}", e)))?;

        let names = body
            .pointer("/d/Names")
            .and_then(|names| names.as_array())
            .ok_or_else(|| {
                RegistrarError::Response("generator reply carries no name list".to_string())
            })?;

        Ok(names
            .iter()
            .filter_map(|name| name.as_str().map(str::to_string))
            .collect())
    }
}
