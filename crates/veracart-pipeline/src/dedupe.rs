//! Duplicate collapsing across backends.
//!
//! The same listing often arrives from several search backends with small
//! title variations and different prices. Records sharing a composite
//! identity key are collapsed to the cheapest surviving copy.

use std::collections::HashMap;

use veracart_core::ValidatedProduct;

/// Number of leading title tokens that participate in the identity key.
const KEY_TITLE_TOKENS: usize = 5;

/// Compute the composite identity key for a (title, source) pair.
///
/// SHA-256 over the lower-cased first five whitespace tokens of the title
/// and the lower-cased source name, NUL-separated. Hex-encoded.
#[must_use]
pub fn identity_key(title: &str, source: &str) -> String {
    use sha2::{Digest, Sha256};

    let title_prefix = title
        .split_whitespace()
        .take(KEY_TITLE_TOKENS)
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ");

    let input = format!("{}\x00{}", title_prefix, source.trim().to_lowercase());
    format!("{:x}", Sha256::digest(input.as_bytes()))
}

/// Collapses products sharing an identity key to one survivor each.
///
/// The survivor is the record with the lowest `price_value`; ties keep the
/// first-seen record. Output preserves first-seen order of the surviving
/// keys (callers re-sort by price afterwards anyway). Idempotent: running
/// on its own output changes nothing.
#[must_use]
pub fn dedupe(products: Vec<ValidatedProduct>) -> Vec<ValidatedProduct> {
    let mut survivors: Vec<ValidatedProduct> = Vec::with_capacity(products.len());
    let mut index_by_key: HashMap<String, usize> = HashMap::new();

    for product in products {
        let key = identity_key(&product.title, &product.source);
        match index_by_key.get(&key) {
            Some(&idx) => {
                if product.price_value < survivors[idx].price_value {
                    tracing::debug!(
                        title = %product.title,
                        kept_price = product.price_value,
                        dropped_price = survivors[idx].price_value,
                        "duplicate listing; keeping cheaper copy"
                    );
                    survivors[idx] = product;
                }
            }
            None => {
                index_by_key.insert(key, survivors.len());
                survivors.push(product);
            }
        }
    }

    survivors
}
