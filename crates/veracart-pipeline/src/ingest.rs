//! Normalization from raw backend result mappings to [`Candidate`] records.
//!
//! Search backends disagree on key names, so every required field is looked
//! up through an alias list. A missing required field or an unparseable
//! price rejects only the one item.

use serde_json::Value;

use veracart_core::{Candidate, RawItem, RejectReason};

use crate::price::parse_price;

/// Key aliases for the price field, in priority order.
const PRICE_KEYS: &[&str] = &[
    "price",
    "extracted_price",
    "sale_price",
    "current_price",
    "price_value",
];

/// Key aliases for the product link field, in priority order.
pub(crate) const LINK_KEYS: &[&str] =
    &["product_link", "link", "url", "merchant_link", "buy_link"];

const SOURCE_KEYS: &[&str] = &["source", "merchant"];
const REVIEW_KEYS: &[&str] = &["reviews", "review_count"];
const IMAGE_KEYS: &[&str] = &["thumbnail", "image"];

/// Builds a [`Candidate`] from one raw backend item.
///
/// Required: a non-empty `title`, a link under one of the link aliases, and
/// a price under one of the price aliases that parses to a value in
/// `(0, price_ceiling]`. The source defaults to `"unknown"` when absent.
///
/// # Errors
///
/// Returns [`RejectReason::Malformed`] naming the missing or unusable
/// field. The failure affects only this item.
pub fn candidate_from_raw(raw: &RawItem, price_ceiling: f64) -> Result<Candidate, RejectReason> {
    let title = first_text(raw, &["title"])
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| RejectReason::Malformed("missing title".to_string()))?;

    let link = first_text(raw, LINK_KEYS)
        .filter(|l| !l.trim().is_empty())
        .ok_or_else(|| RejectReason::Malformed("missing product link".to_string()))?;

    let price_text = first_text(raw, PRICE_KEYS)
        .ok_or_else(|| RejectReason::Malformed("missing price".to_string()))?;

    let price = parse_price(&price_text, price_ceiling);
    if price == 0.0 {
        return Err(RejectReason::Malformed(format!(
            "unparseable or out-of-range price '{price_text}'"
        )));
    }

    let source = first_text(raw, SOURCE_KEYS)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "unknown".to_string());

    Ok(Candidate {
        title: title.trim().to_string(),
        price_text,
        price,
        source,
        link: link.trim().to_string(),
        rating: first_text(raw, &["rating"]),
        review_count: first_text(raw, REVIEW_KEYS),
        image_url: first_text(raw, IMAGE_KEYS),
    })
}

/// Returns the first present key's value rendered as text.
///
/// Strings pass through; numbers are formatted (integers without a
/// trailing `.0`); other JSON types are treated as absent.
fn first_text(raw: &RawItem, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match raw.get(*key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
