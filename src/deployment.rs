use std::env;
use std::sync::Arc;

use log::info;
use teloxide::prelude::*;

#[cfg(feature = "axum-server")]
use axum::{Router, routing::get, routing::post};

#[cfg(feature = "lambda")]
use lambda_runtime::service_fn;

use crate::handlers::handle_message;
use crate::report::ReportPipeline;

#[cfg(feature = "lambda")]
use crate::handlers::lambda_handler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentMode {
    Lambda,
    Webhook,
    Polling,
}

impl std::fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeploymentMode::Lambda => write!(f, "AWS LAMBDA"),
            DeploymentMode::Webhook => write!(f, "WEBHOOK (Production)"),
            DeploymentMode::Polling => write!(f, "POLLING (Development)"),
        }
    }
}

const LAMBDA_MARKERS: [&str; 2] = ["AWS_LAMBDA_FUNCTION_NAME", "LAMBDA_RUNTIME_API"];
const HOSTING_MARKERS: [&str; 3] = ["RAILWAY_ENVIRONMENT", "HEROKU_APP_NAME", "VERCEL"];
const PRODUCTION_SWITCHES: [&str; 2] = ["ENVIRONMENT", "DEPLOYMENT_ENV"];

pub fn detect_deployment_mode() -> DeploymentMode {
    detect_from(|name| env::var(name).ok())
}

/// Lambda wins over webhook, webhook over polling
pub fn detect_from<F>(lookup: F) -> DeploymentMode
where
    F: Fn(&str) -> Option<String>,
{
    let is_set = |name: &str| lookup(name).is_some();
    let equals = |name: &str, value: &str| lookup(name).is_some_and(|v| v == value);

    let lambda = LAMBDA_MARKERS.iter().any(|name| is_set(name)) || equals("LAMBDA_MODE", "true");
    if lambda {
        return DeploymentMode::Lambda;
    }

    let production = HOSTING_MARKERS.iter().any(|name| is_set(name))
        || PRODUCTION_SWITCHES.iter().any(|name| equals(name, "production"))
        || (is_set("PORT") && is_set("WEBHOOK_URL"))
        || equals("WEBHOOK_MODE", "true");

    if production {
        DeploymentMode::Webhook
    } else {
        DeploymentMode::Polling
    }
}

#[cfg(feature = "lambda")]
pub async fn run_lambda_mode(
    bot: Bot,
    pipeline: Arc<ReportPipeline>,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("☁️ AWS Lambda environment detected - setting up Lambda runtime");

    if let Ok(webhook_url) = env::var("WEBHOOK_URL") {
        info!("🔗 Setting up webhook at: {webhook_url}");
        bot.set_webhook(webhook_url.parse()?)
            .await
            .map_err(|e| format!("Failed to set webhook: {e}"))?;
    }

    info!("👂 Lambda handler ready to receive comparison requests!");
    lambda_runtime::run(service_fn(move |event| {
        let pipeline = Arc::clone(&pipeline);
        async move { lambda_handler(event, pipeline).await }
    }))
    .await
    .map_err(|e| format!("Lambda runtime failed: {e}").into())
}

#[cfg(feature = "axum-server")]
#[derive(Clone)]
struct WebhookState {
    bot: Bot,
    pipeline: Arc<ReportPipeline>,
}

#[cfg(feature = "axum-server")]
pub async fn run_webhook_mode(
    bot: Bot,
    pipeline: Arc<ReportPipeline>,
) -> Result<(), Box<dyn std::error::Error>> {
    use axum::Json;
    use axum::extract::State;
    use axum::response::Html;

    async fn health_check() -> Html<&'static str> {
        Html("<h1>Stock comparison bot is running!</h1>")
    }

    async fn webhook_handler(
        State(state): State<WebhookState>,
        Json(update): Json<teloxide::types::Update>,
    ) -> &'static str {
        info!("🔗 Webhook received update: {:?}", update.id);

        if let teloxide::types::UpdateKind::Message(message) = update.kind {
            // A report takes several provider round trips; answer Telegram right away
            tokio::spawn(async move {
                if let Err(e) = handle_message(state.bot, message, state.pipeline).await {
                    log::warn!("❌ Failed to handle update: {e}");
                }
            });
        } else {
            info!("🔄 Received non-message update in webhook");
        }
        "OK"
    }

    let webhook_url =
        env::var("WEBHOOK_URL").map_err(|_| "WEBHOOK_URL must be set for webhook mode")?;
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .map_err(|_| "PORT must be a valid number")?;

    info!("🌐 Production environment detected - running in WEBHOOK mode");
    info!("🔗 Setting up webhook at: {webhook_url}");

    bot.set_webhook(webhook_url.parse()?)
        .await
        .map_err(|e| format!("Failed to set webhook: {e}"))?;

    let app = Router::new()
        .route("/", get(health_check))
        .route("/webhook", post(webhook_handler))
        .with_state(WebhookState { bot, pipeline });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .map_err(|e| format!("Failed to bind to port: {e}"))?;

    info!("👂 Webhook server listening on port {port}");

    axum::serve(listener, app)
        .await
        .map_err(|e| format!("Server failed: {e}").into())
}

pub async fn run_polling_mode(bot: Bot, pipeline: Arc<ReportPipeline>) {
    info!("🔄 Development environment detected - running in POLLING mode");

    let handler = Update::filter_message().endpoint(handle_message);
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![pipeline])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}
