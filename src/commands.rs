use std::sync::Arc;

use log::{info, warn};
use teloxide::{prelude::*, types::ChatAction, utils::command::BotCommands};

use crate::presenter::{
    format_price_chart, format_report_error, format_stock_error, format_stock_summary,
    render_report,
};
use crate::report::ReportPipeline;

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(
    rename_rule = "lowercase",
    description = "These commands are supported:"
)]
pub enum Command {
    #[command(description = "display this text.")]
    Help,
    #[command(
        description = "compare two stocks and get an AI investment analysis - use '/compare AAPL MSFT'.",
        parse_with = "split"
    )]
    Compare { first: String, second: String },
    #[command(description = "show key metrics and a price chart for one stock - use '/stock AAPL'.")]
    Stock(String),
    #[command(description = "fetch one stock again, skipping cached data - use '/refresh AAPL'.")]
    Refresh(String),
}

const MAX_TICKER_LEN: usize = 15;

/// Ticker-shaped: ASCII letters, digits, `.` or `-`, starting with a letter or
/// digit. An all-lowercase word reads as prose, so "hi there" is not a pair.
fn looks_like_ticker(word: &str) -> bool {
    let shaped = word.len() <= MAX_TICKER_LEN
        && word.starts_with(|c: char| c.is_ascii_alphanumeric())
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    let prose = word.chars().all(|c| c.is_ascii_lowercase());

    shaped && !prose
}

/// Two bare ticker-shaped words ("AAPL MSFT") are read as a comparison request
pub fn parse_ticker_pair(text: &str) -> Option<Command> {
    let mut words = text.split_whitespace();
    match (words.next(), words.next(), words.next()) {
        (Some(first), Some(second), None)
            if looks_like_ticker(first) && looks_like_ticker(second) =>
        {
            Some(Command::Compare {
                first: first.to_string(),
                second: second.to_string(),
            })
        }
        _ => None,
    }
}

pub async fn answer(
    bot: Bot,
    msg: Message,
    cmd: Command,
    pipeline: Arc<ReportPipeline>,
) -> ResponseResult<()> {
    let chat_type = if msg.chat.is_private() {
        "Private"
    } else if msg.chat.is_group() {
        "Group"
    } else if msg.chat.is_supergroup() {
        "Supergroup"
    } else {
        "Channel"
    };

    let username = msg
        .from
        .as_ref()
        .and_then(|user| user.username.as_deref())
        .unwrap_or("<no_username>");

    info!(
        "📨 Received message in {} chat (ID: {}) from @{}: '{}'",
        chat_type,
        msg.chat.id,
        username,
        msg.text().unwrap_or("<no_text>")
    );
    info!("💬 Processing command: {cmd:?}");

    match cmd {
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
        }
        Command::Compare { first, second } => {
            info!("📊 Comparison request from chat {}: {first} vs {second}", msg.chat.id);
            bot.send_chat_action(msg.chat.id, ChatAction::Typing).await?;

            match pipeline.compare(&first, &second).await {
                Ok(report) => {
                    let messages = render_report(&report);
                    info!(
                        "📤 Sending {} report messages to chat {} for {} vs {}",
                        messages.len(),
                        msg.chat.id,
                        report.first.symbol,
                        report.second.symbol
                    );
                    for message in messages {
                        bot.send_message(msg.chat.id, message).await?;
                    }
                }
                Err(e) => {
                    warn!("❌ Report failed for chat {}: {e}", msg.chat.id);
                    bot.send_message(msg.chat.id, format_report_error(&e)).await?;
                }
            }
        }
        Command::Stock(symbol) | Command::Refresh(symbol) if symbol.trim().is_empty() => {
            let response = "Please provide a stock symbol. Example: /stock AAPL";
            bot.send_message(msg.chat.id, response).await?;
        }
        Command::Refresh(symbol) => {
            bot.send_chat_action(msg.chat.id, ChatAction::Typing).await?;

            match pipeline.refresh(&symbol).await {
                Ok(record) => {
                    info!("🔄 Refreshed {} for chat {}", record.symbol, msg.chat.id);
                    bot.send_message(msg.chat.id, format_stock_summary(&record)).await?;
                }
                Err(e) => {
                    warn!("❌ Refresh failed for chat {} ({}): {:?}", msg.chat.id, symbol, e);
                    bot.send_message(msg.chat.id, format_stock_error(&e, Some(&symbol)))
                        .await?;
                }
            }
        }
        Command::Stock(symbol) => {
            bot.send_chat_action(msg.chat.id, ChatAction::Typing).await?;

            match pipeline.lookup(&symbol).await {
                Ok(record) => {
                    let response = format!(
                        "{}\n\n{}",
                        format_stock_summary(&record),
                        format_price_chart(&record)
                    );
                    info!("📤 Sending stock metrics to chat {} for {}", msg.chat.id, record.symbol);
                    bot.send_message(msg.chat.id, response).await?;
                }
                Err(e) => {
                    warn!("❌ Stock lookup failed for chat {} ({}): {:?}", msg.chat.id, symbol, e);
                    bot.send_message(msg.chat.id, format_stock_error(&e, Some(&symbol)))
                        .await?;
                }
            }
        }
    };

    Ok(())
}
