//! Comparison prompt sent to the narrative model

use std::fmt::Write;

use crate::format::{format_decimal, format_money, format_percent, format_price};
use crate::stock::StockRecord;

pub const REPORT_SECTIONS: [&str; 4] = [
    "Valuation Analysis",
    "Growth & Profitability",
    "Risk & Outlook",
    "Conclusion & Recommendation",
];

/// Render both records side by side, ending with the instruction to the model
pub fn build_prompt(a: &StockRecord, b: &StockRecord) -> String {
    let mut prompt = String::from(
        "You are reviewing two publicly traded companies for a retail investor. \
         Compare the following two stocks and give a detailed investment analysis.\n\n",
    );

    write_stock_block(&mut prompt, 1, a);
    prompt.push_str("\n---\n\n");
    write_stock_block(&mut prompt, 2, b);
    prompt.push_str("\n---\n\n");

    prompt.push_str(
        "Using only the data above, write a structured comparison in markdown with these sections:\n",
    );
    for section in REPORT_SECTIONS {
        let _ = writeln!(prompt, "## {section}");
    }
    let _ = write!(
        prompt,
        "\nWhich stock is the better buy right now, {} or {}, and why? \
         Give markdown-formatted investment advice.\n",
        a.symbol, b.symbol
    );

    prompt
}

fn write_stock_block(out: &mut String, index: usize, record: &StockRecord) {
    let cur = record.currency_symbol.as_str();

    let _ = writeln!(out, "### Stock {index}: {} ({})", record.long_name, record.symbol);
    let _ = writeln!(out, "- Sector: {}", record.sector.as_deref().unwrap_or("N/A"));
    let _ = writeln!(out, "- Current Price: {}", format_price(record.price, cur));
    let _ = writeln!(out, "- Market Cap: {}", format_money(record.market_cap, cur));
    let _ = writeln!(out, "- P/E Ratio (Trailing): {}", format_decimal(record.pe_ratio_trailing));
    let _ = writeln!(out, "- P/E Ratio (Forward): {}", format_decimal(record.pe_ratio_forward));
    let _ = writeln!(out, "- P/B Ratio: {}", format_decimal(record.pb_ratio));
    let _ = writeln!(
        out,
        "- Dividend Yield: {}",
        record
            .dividend_yield
            .map_or_else(|| "N/A".to_string(), |y| format!("{:.2}%", y * 100.0))
    );
    let _ = writeln!(out, "- Beta: {}", format_decimal(record.beta));
    let _ = writeln!(out, "- Annual Revenue: {}", format_money(record.annual_revenue, cur));
    let _ = writeln!(out, "- Gross Profit: {}", format_money(record.gross_profit, cur));
    let _ = writeln!(out, "- 1-Year Price Change: {}", format_percent(record.price_1y_change_pct));
    let _ = writeln!(out, "- 5-Year Price Change: {}", format_percent(record.price_5y_change_pct));

    let _ = writeln!(out, "\nBusiness Summary:\n{}\n", record.business_summary);

    let _ = writeln!(
        out,
        "Recent {}-Day Closing Prices ({}):",
        record.recent_closes.len(),
        record.currency_code
    );
    out.push_str("| Date | Close |\n|------|-------|\n");
    for point in &record.recent_closes {
        let _ = writeln!(out, "| {} | {:.2} |", point.date.format("%Y-%m-%d"), point.close);
    }
}
