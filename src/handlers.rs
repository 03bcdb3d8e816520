use std::sync::Arc;

use log::info;

#[cfg(feature = "lambda")]
use log::warn;
use teloxide::{
    prelude::*,
    utils::command::{BotCommands, ParseError},
};

#[cfg(feature = "lambda")]
use lambda_runtime::{Error as LambdaError, LambdaEvent};
#[cfg(feature = "lambda")]
use serde_json::Value;

use crate::commands::{Command, answer, parse_ticker_pair};
use crate::report::ReportPipeline;

/// How a piece of chat text should be handled once any bot mention is removed
#[derive(Debug, PartialEq)]
pub enum Interpretation {
    Run(Command),
    UnknownCommand,
    BadArguments(String),
    NotUnderstood,
    Empty,
}

pub fn interpret(text: &str) -> Interpretation {
    let text = text.trim();

    if text.starts_with('/') {
        return match Command::parse(text, "") {
            Ok(cmd) => Interpretation::Run(cmd),
            Err(ParseError::UnknownCommand(_)) => Interpretation::UnknownCommand,
            Err(e) => Interpretation::BadArguments(e.to_string()),
        };
    }

    if let Some(cmd) = parse_ticker_pair(text) {
        Interpretation::Run(cmd)
    } else if text.is_empty() {
        Interpretation::Empty
    } else {
        Interpretation::NotUnderstood
    }
}

pub async fn handle_message(
    bot: Bot,
    msg: Message,
    pipeline: Arc<ReportPipeline>,
) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        info!("📷 Received non-text message");
        return Ok(());
    };

    let bot_user = bot.get_me().await?;
    let bot_username = bot_user.username.as_deref().unwrap_or("bot");
    let bot_mention = format!("@{bot_username}");
    let is_private_chat = msg.chat.is_private();
    let is_mentioned = text.contains(&bot_mention);

    info!(
        "💬 Chat type: {}, Bot mentioned: {}",
        if is_private_chat { "Private" } else { "Group" },
        is_mentioned
    );

    // Groups only get an answer when the bot is addressed
    if !is_private_chat && !is_mentioned {
        info!("😶 Group message without bot mention - ignoring");
        return Ok(());
    }

    let processed_text = if is_mentioned {
        let cleaned = text.replace(&bot_mention, "").trim().to_string();
        info!("🧽 Cleaned text after removing mention: '{cleaned}'");
        cleaned
    } else {
        text.to_string()
    };

    match interpret(&processed_text) {
        Interpretation::Run(cmd) => {
            info!("✅ Command parsed successfully: {cmd:?}");
            answer(bot, msg, cmd, pipeline).await?;
        }
        Interpretation::UnknownCommand => {
            info!("❌ Unknown command: '{processed_text}'");
            let response = format!(
                "Unknown command: {}\n\nAvailable commands:\n{}",
                processed_text,
                Command::descriptions()
            );
            bot.send_message(msg.chat.id, response).await?;
        }
        Interpretation::BadArguments(reason) => {
            info!("❌ Bad arguments for '{processed_text}': {reason}");
            let response = format!(
                "Could not read that command: {}\n\n{}",
                reason,
                Command::descriptions()
            );
            bot.send_message(msg.chat.id, response).await?;
        }
        Interpretation::NotUnderstood => {
            info!("🤷 Not a command or ticker pair: '{processed_text}'");
            let response = format!(
                "Send two ticker symbols to compare them, e.g. \"AAPL MSFT\".\n\n{}",
                Command::descriptions()
            );
            bot.send_message(msg.chat.id, response).await?;
        }
        Interpretation::Empty => {
            let response = if is_private_chat {
                format!(
                    "Hello! Send me two tickers to compare.\n\n{}",
                    Command::descriptions()
                )
            } else {
                format!(
                    "Hello! You mentioned me. Send two tickers after @{}.\n\n{}",
                    bot_username,
                    Command::descriptions()
                )
            };
            bot.send_message(msg.chat.id, response).await?;
        }
    }

    Ok(())
}

#[cfg(feature = "lambda")]
pub async fn lambda_handler(
    event: LambdaEvent<Value>,
    pipeline: Arc<ReportPipeline>,
) -> Result<Value, LambdaError> {
    let bot = Bot::from_env();

    let Some(body) = event.payload.get("body").and_then(|b| b.as_str()) else {
        warn!("❌ No body field found in Lambda event");
        return Ok(lambda_ok());
    };

    match serde_json::from_str::<teloxide::types::Update>(body) {
        Ok(update) => {
            info!("✅ Lambda received Telegram update: {:?}", update.id);
            if let teloxide::types::UpdateKind::Message(message) = update.kind {
                if let Err(e) = handle_message(bot, message, pipeline).await {
                    warn!("❌ Failed to handle update: {e}");
                }
            } else {
                info!("🔄 Received non-message update in Lambda");
            }
        }
        Err(e) => warn!("❌ Failed to parse Telegram update: {e}"),
    }

    Ok(lambda_ok())
}

// Telegram retries on anything but 200, so failures are logged and swallowed
#[cfg(feature = "lambda")]
fn lambda_ok() -> Value {
    serde_json::json!({
        "statusCode": 200,
        "body": "OK"
    })
}
