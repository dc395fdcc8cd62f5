//! One extraction cycle: fetch both tables, decode them, assemble events.

use tracing::{debug, info};

use crate::assembler::{assemble, MappingTable};
use crate::codec::{decode_envelope, decode_mappings, decode_odds, OddsRow, MAPPINGS_FIELD, ODDS_FIELD};
use crate::config::Config;
use crate::error::ExtractError;
use crate::fetcher::{ConditionalFetcher, UpstreamClient};
use crate::model::SportEvent;

/// An upstream endpoint whose JSON body carries one textual payload field.
pub struct ApiHandler {
    fetcher: ConditionalFetcher,
    field: &'static str,
}

impl ApiHandler {
    pub fn new(fetcher: ConditionalFetcher, field: &'static str) -> Self {
        Self { fetcher, field }
    }

    pub fn url(&self) -> &str {
        self.fetcher.url()
    }

    /// Fetch the body and return the payload field's text.
    pub async fn payload(&mut self) -> Result<String, ExtractError> {
        let body = self
            .fetcher
            .fetch()
            .await
            .map_err(|source| ExtractError::Fetch {
                what: self.field,
                source,
            })?;

        decode_envelope(&body, self.field).map_err(|source| ExtractError::Decode {
            what: self.field,
            source,
        })
    }
}

pub struct SportEventDataExtractor {
    odds: ApiHandler,
    mappings: ApiHandler,
}

impl SportEventDataExtractor {
    pub fn new(odds: ApiHandler, mappings: ApiHandler) -> Self {
        Self { odds, mappings }
    }

    /// Handlers for the configured odds (`/state`) and mappings endpoints.
    pub fn from_config(config: &Config, client: UpstreamClient) -> Self {
        Self::new(
            ApiHandler::new(ConditionalFetcher::new(config.odds_url(), client.clone()), ODDS_FIELD),
            ApiHandler::new(ConditionalFetcher::new(config.mappings_url(), client), MAPPINGS_FIELD),
        )
    }

    /// Any error here means the whole batch is rejected.
    pub async fn extract(&mut self) -> Result<Vec<SportEvent>, ExtractError> {
        let (odds, mappings) = tokio::try_join!(self.odds.payload(), self.mappings.payload())?;

        let rows: Vec<OddsRow> = decode_odds(&odds).map_err(|source| ExtractError::Decode {
            what: ODDS_FIELD,
            source,
        })?;
        let mappings: MappingTable = decode_mappings(&mappings)
            .map_err(|source| ExtractError::Decode {
                what: MAPPINGS_FIELD,
                source,
            })?
            .into();
        debug!(
            odds_url = self.odds.url(),
            mappings_url = self.mappings.url(),
            rows = rows.len(),
            mappings = mappings.len(),
            "Decoded upstream payloads"
        );

        let events = assemble(&rows, &mappings)?;
        info!("Extracted {}/{} events", events.len(), rows.len());
        Ok(events)
    }
}
