//! # Pricing Module
//!
//! Per-model prices used to turn token counts into a dollar cost.
//!
//! ## Pricing Structure
//!
//! Each model has a price for:
//! - Input tokens (USD per million)
//! - Output tokens (USD per million)
//!
//! Cache creation and cache read tokens are not priced here. They count towards
//! token totals but never towards cost.
//!
//! Unknown model names fall back to [`DEFAULT_MODEL`] so that logging never fails
//! on an unrecognized model string.
//!
//! Prices can be overridden via environment variables (both must parse):
//! - `CLAUDE_PRICE_INPUT`
//! - `CLAUDE_PRICE_OUTPUT`

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::env;

/// Model whose price applies when a lookup misses.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5";

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModelPrice {
    /// USD per million input tokens
    pub input: f64,
    /// USD per million output tokens
    pub output: f64,
}

impl ModelPrice {
    pub const fn new(input: f64, output: f64) -> Self {
        Self { input, output }
    }

    /// Cost of a single call; cache tokens are deliberately not part of this.
    pub fn cost(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        let input_cost = (input_tokens as f64 / 1_000_000.0) * self.input;
        let output_cost = (output_tokens as f64 / 1_000_000.0) * self.output;
        input_cost + output_cost
    }
}

static BUILTIN_PRICES: Lazy<HashMap<&'static str, ModelPrice>> = Lazy::new(|| {
    HashMap::from([
        (DEFAULT_MODEL, ModelPrice::new(3.00, 15.00)),
        ("claude-3-5-sonnet-20241022", ModelPrice::new(3.00, 15.00)),
        ("claude-3-5-sonnet", ModelPrice::new(3.00, 15.00)),
    ])
});

/// Mapping from model name to price, with a guaranteed default entry.
#[derive(Clone, Debug)]
pub struct PriceTable {
    prices: HashMap<String, ModelPrice>,
    default_model: String,
    override_price: Option<ModelPrice>,
}

impl Default for PriceTable {
    fn default() -> Self {
        Self {
            prices: BUILTIN_PRICES
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            default_model: DEFAULT_MODEL.to_string(),
            override_price: None,
        }
    }
}

impl PriceTable {
    /// Built-in table with `CLAUDE_PRICE_INPUT` / `CLAUDE_PRICE_OUTPUT` applied
    /// when both are present and numeric.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`PriceTable::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut table = Self::default();
        table.override_price = override_price(lookup);
        table
    }

    /// Add or replace a model price.
    pub fn insert(&mut self, model: impl Into<String>, price: ModelPrice) {
        self.prices.insert(model.into(), price);
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    pub fn contains(&self, model: &str) -> bool {
        self.prices.contains_key(model)
    }

    /// Price for `model`, falling back to the default entry.
    pub fn price_for(&self, model: &str) -> ModelPrice {
        if let Some(p) = self.override_price {
            return p;
        }
        self.prices
            .get(model)
            .or_else(|| self.prices.get(&self.default_model))
            .copied()
            .unwrap_or(ModelPrice::new(3.00, 15.00))
    }

    pub fn cost(&self, model: &str, input_tokens: u64, output_tokens: u64) -> f64 {
        self.price_for(model).cost(input_tokens, output_tokens)
    }
}

fn override_price(lookup: impl Fn(&str) -> Option<String>) -> Option<ModelPrice> {
    let input = lookup("CLAUDE_PRICE_INPUT")?.trim().parse::<f64>().ok()?;
    let output = lookup("CLAUDE_PRICE_OUTPUT")?.trim().parse::<f64>().ok()?;
    Some(ModelPrice::new(input, output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_pricing_for_known_models() {
        let table = PriceTable::default();
        let sonnet = table.price_for("claude-3-5-sonnet-20241022");
        assert!((sonnet.input - 3.0).abs() < 1e-10);
        assert!((sonnet.output - 15.0).abs() < 1e-10);
        assert!(table.contains(DEFAULT_MODEL));
    }

    #[test]
    fn test_cost_formula() {
        let table = PriceTable::default();
        // 1M input at $3 + 0.5M output at $15
        let cost = table.cost(DEFAULT_MODEL, 1_000_000, 500_000);
        assert!((cost - 10.5).abs() < 1e-9);
        assert_eq!(table.cost(DEFAULT_MODEL, 0, 0), 0.0);
    }

    #[test]
    fn test_unknown_model_uses_default() {
        let table = PriceTable::default();
        assert_eq!(
            table.cost("gpt-something", 1234, 5678),
            table.cost(DEFAULT_MODEL, 1234, 5678)
        );
    }

    #[test]
    fn test_inserted_price_wins() {
        let mut table = PriceTable::default();
        table.insert("claude-opus-4-1", ModelPrice::new(15.0, 75.0));
        let cost = table.cost("claude-opus-4-1", 1_000_000, 1_000_000);
        assert!((cost - 90.0).abs() < 1e-9);
    }

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_env_override_requires_both() {
        let only_input = vars(&[("CLAUDE_PRICE_INPUT", "1.0")]);
        let table = PriceTable::from_lookup(|k| only_input.get(k).cloned());
        assert_eq!(table.price_for(DEFAULT_MODEL).input, 3.0);

        let both = vars(&[("CLAUDE_PRICE_INPUT", "1.0"), ("CLAUDE_PRICE_OUTPUT", " 2.0 ")]);
        let table = PriceTable::from_lookup(|k| both.get(k).cloned());
        assert_eq!(table.price_for("anything"), ModelPrice::new(1.0, 2.0));

        let garbage = vars(&[("CLAUDE_PRICE_INPUT", "1.0"), ("CLAUDE_PRICE_OUTPUT", "cheap")]);
        let table = PriceTable::from_lookup(|k| garbage.get(k).cloned());
        assert_eq!(table.price_for(DEFAULT_MODEL), ModelPrice::new(3.0, 15.0));
    }
}
