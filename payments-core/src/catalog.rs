use anyhow::{Context, Result};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::ports::GamesCatalog;

#[derive(Debug, Deserialize)]
struct GameDto {
    price: f64,
}

/// Read-only client for the games-catalog service.
#[derive(Clone)]
pub struct HttpGamesCatalog {
    http: reqwest::Client,
    base_url: String,
}

impl HttpGamesCatalog {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }
}

#[async_trait]
impl GamesCatalog for HttpGamesCatalog {
    async fn get_price(&self, game_id: Uuid) -> Result<Option<BigDecimal>> {
        let url = format!("{}/api/games/{game_id}", self.base_url);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("games catalog request to {url} failed"))?;

        // Unknown game ids come back as 404; treat any non-success as absent.
        if !resp.status().is_success() {
            return Ok(None);
        }

        let game: GameDto = resp.json().await.context("malformed games catalog body")?;
        let price = BigDecimal::try_from(game.price)
            .with_context(|| format!("catalog price {} is not a valid decimal", game.price))?;

        Ok(Some(price))
    }
}
