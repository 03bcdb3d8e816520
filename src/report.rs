//! Fetch → prompt → narrative, once per comparison request

use log::{info, warn};

use crate::ai::{Narrative, NarrativeBackend, NarrativeError};
use crate::prompt::build_prompt;
use crate::stock::{StockDataError, StockRecord, StockService};

#[derive(Debug)]
pub struct ComparisonReport {
    pub first: StockRecord,
    pub second: StockRecord,
    pub narrative: Narrative,
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Either ticker failed. The message names both.
    #[error("Could not fetch data for {first} or {second}: {source}")]
    Fetch {
        first: String,
        second: String,
        #[source]
        source: StockDataError,
    },
    #[error(transparent)]
    Narrative(#[from] NarrativeError),
}

pub struct ReportPipeline {
    stocks: StockService,
    narrator: Box<dyn NarrativeBackend>,
}

impl ReportPipeline {
    pub fn new(stocks: StockService, narrator: Box<dyn NarrativeBackend>) -> Self {
        Self { stocks, narrator }
    }

    /// Single-ticker lookup for the metrics-only command
    pub async fn lookup(&self, ticker: &str) -> Result<StockRecord, StockDataError> {
        self.stocks.fetch(ticker).await
    }

    /// Like `lookup`, but ignores any cached record
    pub async fn refresh(&self, ticker: &str) -> Result<StockRecord, StockDataError> {
        self.stocks.invalidate(ticker).await;
        self.stocks.fetch(ticker).await
    }

    /// Run the whole comparison. Nothing is sent to the narrator unless both
    /// tickers resolved.
    pub async fn compare(&self, first: &str, second: &str) -> Result<ComparisonReport, ReportError> {
        let first = first.trim().to_uppercase();
        let second = second.trim().to_uppercase();

        info!("📊 Building comparison report for {first} vs {second}");

        let fetched = match self.stocks.fetch(&first).await {
            Ok(a) => self.stocks.fetch(&second).await.map(|b| (a, b)),
            Err(e) => Err(e),
        };

        let (a, b) = fetched.map_err(|source| {
            warn!("❌ Aborting report for {first} vs {second}: {source}");
            ReportError::Fetch {
                first: first.clone(),
                second: second.clone(),
                source,
            }
        })?;

        let prompt = build_prompt(&a, &b);
        info!("📝 Prompt built ({} chars), asking {}", prompt.len(), self.narrator.name());

        let narrative = self.narrator.narrate(&prompt).await?;

        Ok(ComparisonReport {
            first: a,
            second: b,
            narrative,
        })
    }
}
