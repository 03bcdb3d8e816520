use std::sync::Arc;

use log::info;
use teloxide::prelude::*;

mod ai;
mod commands;
mod config;
mod deployment;
mod format;
mod handlers;
mod presenter;
mod prompt;
mod report;
mod stock;
#[cfg(test)]
mod test_support;

use ai::ChatCompletionBackend;
use config::AppConfig;
use deployment::{DeploymentMode, detect_deployment_mode, run_polling_mode};
use report::ReportPipeline;
use stock::{NoopRecordCache, RecordCache, StockService, TimedRecordCache};

#[cfg(feature = "lambda")]
use deployment::run_lambda_mode;

#[cfg(feature = "axum-server")]
use deployment::run_webhook_mode;

async fn build_pipeline(config: AppConfig) -> Result<ReportPipeline, Box<dyn std::error::Error>> {
    let cache: Arc<dyn RecordCache> = match config.cache_ttl {
        Some(ttl) => {
            info!("🗄️ Caching stock records for {}s", ttl.as_secs());
            Arc::new(TimedRecordCache::new(ttl))
        }
        None => {
            info!("🗄️ Stock record cache disabled");
            Arc::new(NoopRecordCache)
        }
    };

    let stocks = StockService::new(config.provider, cache, config.history_window).await?;
    info!(
        "📈 Stock data from {} ({}-day history window)",
        stocks.provider_name(),
        config.history_window
    );

    let llm = config.llm;
    info!("🤖 Narratives from {} via {}", llm.model, llm.base_url);
    let narrator = ChatCompletionBackend::new(llm.api_key, llm.base_url, llm.model);

    Ok(ReportPipeline::new(stocks, Box::new(narrator)))
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();
    info!("Starting stock comparison bot...");

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => panic!("Invalid configuration: {e}"),
    };

    let pipeline = match build_pipeline(config).await {
        Ok(pipeline) => Arc::new(pipeline),
        Err(e) => panic!("Failed to initialize report pipeline: {e}"),
    };

    let bot = Bot::from_env();
    let deployment_mode = detect_deployment_mode();

    info!("🚀 Bot deployment detection: {deployment_mode}");

    let result = match deployment_mode {
        DeploymentMode::Lambda => {
            #[cfg(feature = "lambda")]
            {
                run_lambda_mode(bot, pipeline).await
            }
            #[cfg(not(feature = "lambda"))]
            {
                panic!("Lambda environment detected but lambda feature not enabled. Compile with --features lambda");
            }
        }
        DeploymentMode::Webhook => {
            #[cfg(feature = "axum-server")]
            {
                run_webhook_mode(bot, pipeline).await
            }
            #[cfg(not(feature = "axum-server"))]
            {
                panic!("Production environment detected but axum-server feature not enabled. Compile with --features axum-server");
            }
        }
        DeploymentMode::Polling => {
            run_polling_mode(bot, pipeline).await;
            Ok(())
        }
    };

    if let Err(e) = result {
        panic!("Bot failed to start: {e}");
    }
}
