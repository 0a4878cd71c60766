//! OCR vendor client
//!
//! Sends captured competitor price images (base64 in a JSON body) to the
//! OCR service and extracts product/price fields from the returned text.

use crate::config::VendorConfig;
use crate::error::AppError;
use base64::Engine;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("lumina-api/", env!("CARGO_PKG_VERSION"));

/// OCR client errors
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("No text recognized in image")]
    NoText,
}

impl From<OcrError> for AppError {
    fn from(e: OcrError) -> Self {
        AppError::Vendor(e.to_string())
    }
}

/// Raw OCR result for one image
#[derive(Debug, Clone, Deserialize)]
pub struct OcrExtraction {
    pub text: String,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Price fields recognized in OCR text
#[derive(Debug, Clone, PartialEq)]
pub struct PriceReading {
    pub product_name: String,
    pub price: f64,
    pub currency: String,
}

/// OCR API client
#[derive(Clone)]
pub struct OcrClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OcrClient {
    pub fn new(config: &VendorConfig) -> Result<Self, OcrError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| OcrError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.ocr_api_url.trim_end_matches('/').to_string(),
            api_key: config.ocr_api_key.clone(),
        })
    }

    /// Run OCR over one image
    pub async fn extract_text(&self, image: &[u8], file_name: &str) -> Result<OcrExtraction, OcrError> {
        let url = format!("{}/v1/parse", self.base_url);

        let payload = serde_json::json!({
            "image": base64::engine::general_purpose::STANDARD.encode(image),
            "filename": file_name,
        });

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| OcrError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::Api(status.as_u16(), body));
        }

        let extraction: OcrExtraction = response
            .json()
            .await
            .map_err(|e| OcrError::Parse(e.to_string()))?;

        if extraction.text.trim().is_empty() {
            return Err(OcrError::NoText);
        }

        Ok(extraction)
    }
}

/// Pull product name and price out of OCR text
///
/// Price tags read as a product line followed by an amount with a currency
/// marker. The first line carrying an amount wins; everything above it is
/// taken as the product name.
pub fn parse_price_text(text: &str) -> Option<PriceReading> {
    let mut name_lines: Vec<&str> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some((price, currency)) = parse_amount(line) {
            let product_name = if name_lines.is_empty() {
                // Amount-only capture; reuse the remainder of the line
                strip_amount(line)
            } else {
                name_lines.join(" ")
            };
            return Some(PriceReading {
                product_name,
                price,
                currency,
            });
        }

        name_lines.push(line);
    }

    None
}

/// Recognize `$12.99`, `12.99 USD`, `EUR 8,50` and similar forms
fn parse_amount(line: &str) -> Option<(f64, String)> {
    const SYMBOLS: &[(&str, &str)] = &[("$", "USD"), ("€", "EUR"), ("£", "GBP"), ("¥", "JPY")];
    const CODES: &[&str] = &["USD", "EUR", "GBP", "JPY", "BRL", "INR"];

    for (symbol, code) in SYMBOLS {
        if let Some(pos) = line.find(symbol) {
            let rest = &line[pos + symbol.len()..];
            if let Some(value) = leading_number(rest) {
                return Some((value, code.to_string()));
            }
        }
    }

    for code in CODES {
        if let Some(pos) = line.find(code) {
            let after = line[pos + code.len()..].trim_start();
            let before = line[..pos].trim_end();
            if let Some(value) = leading_number(after) {
                return Some((value, code.to_string()));
            }
            if let Some(value) = trailing_number(before) {
                return Some((value, code.to_string()));
            }
        }
    }

    None
}

fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let end = s
        .find(|c: char| !c.is_ascii_digit() && c != '.' && c != ',')
        .unwrap_or(s.len());
    normalize_number(&s[..end])
}

fn trailing_number(s: &str) -> Option<f64> {
    let start = s
        .rfind(|c: char| !c.is_ascii_digit() && c != '.' && c != ',')
        .map(|i| i + 1)
        .unwrap_or(0);
    normalize_number(&s[start..])
}

fn normalize_number(s: &str) -> Option<f64> {
    if s.is_empty() {
        return None;
    }
    // Decimal comma is common on European price tags
    let normalized = if s.contains(',') && !s.contains('.') {
        s.replace(',', ".")
    } else {
        s.replace(',', "")
    };
    normalized.parse().ok()
}

fn strip_amount(line: &str) -> String {
    line.chars()
        .take_while(|c| !c.is_ascii_digit() && *c != '$' && *c != '€' && *c != '£' && *c != '¥')
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_symbol_price() {
        let reading = parse_price_text("Espresso Blend 500g\n$12.99").unwrap();
        assert_eq!(reading.product_name, "Espresso Blend 500g");
        assert_eq!(reading.price, 12.99);
        assert_eq!(reading.currency, "USD");
    }

    #[test]
    fn test_parse_code_after_amount() {
        let reading = parse_price_text("House Roast\n8.50 EUR").unwrap();
        assert_eq!(reading.price, 8.5);
        assert_eq!(reading.currency, "EUR");
    }

    #[test]
    fn test_parse_decimal_comma() {
        let reading = parse_price_text("Filterkaffee\nEUR 8,50").unwrap();
        assert_eq!(reading.price, 8.5);
        assert_eq!(reading.currency, "EUR");
    }

    #[test]
    fn test_parse_thousands_separator() {
        let reading = parse_price_text("Grinder Pro\n$1,299.00").unwrap();
        assert_eq!(reading.price, 1299.0);
    }

    #[test]
    fn test_multi_line_name() {
        let reading = parse_price_text("Dark Roast\nWhole Bean\n£9.75").unwrap();
        assert_eq!(reading.product_name, "Dark Roast Whole Bean");
        assert_eq!(reading.currency, "GBP");
    }

    #[test]
    fn test_no_amount_found() {
        assert!(parse_price_text("no prices here").is_none());
        assert!(parse_price_text("").is_none());
    }
}
