//! Telegram burn notifications
//!
//! Every send swallows its own errors: a notification must never fail a
//! pipeline run that already moved funds.

use serde_json::json;
use std::time::Duration;

use crate::config::AppConfig;

pub struct TelegramNotifier {
    http: reqwest::Client,
    bot_token: String,
    chat_id: String,
    http_timeout: Duration,
}

impl TelegramNotifier {
    /// `None` unless both the bot token and chat id are configured.
    pub fn from_config(config: &AppConfig) -> Option<Self> {
        let bot_token = config.telegram_bot_token.clone()?;
        let chat_id = config.telegram_chat_id.clone()?;
        Some(Self {
            http: reqwest::Client::new(),
            bot_token,
            chat_id,
            http_timeout: Duration::from_secs(config.http_timeout_secs),
        })
    }

    async fn send_message(&self, text: String) {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);
        let result = self
            .http
            .post(url)
            .timeout(self.http_timeout)
            .json(&json!({
                "chat_id": self.chat_id,
                "text": text,
                "parse_mode": "HTML",
                "disable_web_page_preview": true,
            }))
            .send()
            .await;

        match result {
            Ok(response) if !response.status().is_success() => {
                log::warn!("Telegram rejected notification: {}", response.status());
            }
            Err(e) => log::warn!("Telegram notification failed: {}", e),
            _ => {}
        }
    }

    pub async fn notify_burn(
        &self,
        label: &str,
        sol_spent: f64,
        tokens_burned: f64,
        buy_signature: &str,
        burn_signature: &str,
    ) {
        self.send_message(format!(
            "🔥 <b>BURN EXECUTED</b>\n\n\
             <b>Token:</b> {}\n\
             <b>SOL Spent:</b> {:.4} SOL\n\
             <b>Tokens Burned:</b> {}\n\n\
             <a href=\"https://solscan.io/tx/{}\">Buy TX</a> | \
             <a href=\"https://solscan.io/tx/{}\">Burn TX</a>",
            label,
            sol_spent,
            format_number(tokens_burned),
            buy_signature,
            burn_signature,
        ))
        .await;
    }

    pub async fn notify_platform_burn(
        &self,
        sol_spent: f64,
        tokens_burned: f64,
        buy_signature: &str,
        burn_signature: &str,
        source_project: &str,
    ) {
        self.send_message(format!(
            "♻️ <b>PLATFORM BURN</b>\n\n\
             <b>Tokens Burned:</b> {}\n\
             <b>SOL Spent:</b> {:.4} SOL\n\
             <b>Source:</b> {}\n\n\
             <a href=\"https://solscan.io/tx/{}\">Buy TX</a> | \
             <a href=\"https://solscan.io/tx/{}\">Burn TX</a>",
            format_number(tokens_burned),
            sol_spent,
            truncate(source_project),
            buy_signature,
            burn_signature,
        ))
        .await;
    }

    pub async fn notify_new_project(
        &self,
        name: Option<&str>,
        ticker: Option<&str>,
        token_mint: &str,
        deposit_wallet: &str,
    ) {
        self.send_message(format!(
            "🆕 <b>NEW PROJECT REGISTERED</b>\n\n\
             <b>Token:</b> {}\n\
             <b>Ticker:</b> {}\n\
             <b>Mint:</b> <code>{}</code>\n\n\
             <b>Deposit Wallet:</b>\n<code>{}</code>",
            name.or(ticker).unwrap_or("Unknown"),
            ticker.unwrap_or("—"),
            token_mint,
            deposit_wallet,
        ))
        .await;
    }
}

fn truncate(address: &str) -> String {
    if address.len() <= 10 {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}

fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return "0".to_string();
    }
    if n >= 1_000_000.0 {
        format!("{:.2}M", n / 1_000_000.0)
    } else if n >= 1_000.0 {
        format!("{:.2}K", n / 1_000.0)
    } else {
        format!("{:.2}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_strings() {
        assert_eq!(truncate("short"), "short");
    }

    #[test]
    fn truncate_elides_addresses() {
        assert_eq!(
            truncate("So11111111111111111111111111111111111111112"),
            "So1111...1112"
        );
    }

    #[test]
    fn format_number_scales_units() {
        assert_eq!(format_number(12.5), "12.50");
        assert_eq!(format_number(12_500.0), "12.50K");
        assert_eq!(format_number(3_200_000.0), "3.20M");
        assert_eq!(format_number(f64::NAN), "0");
    }
}
