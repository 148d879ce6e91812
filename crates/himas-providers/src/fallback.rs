//! Model fallback chain.
//!
//! When the primary model fails, the chat path walks an ordered list of
//! alternatives. The list is sorted by parameter count, largest first, so
//! the best model that still answers is used.

use himas_core::{
    error::HimasError,
    message::{GenerateRequest, Generation},
    traits::Provider,
};
use tracing::warn;

/// Parameter count (in billions) parsed from a model tag such as
/// `qwen2.5:7b` or `mistral-7b`. Unknown sizes sort last.
pub fn model_size(name: &str) -> u32 {
    let lower = name.to_lowercase();
    let digits_before_b = |s: &str| -> Option<u32> {
        let s = s.strip_suffix('b')?;
        let start = s
            .rfind(|c: char| !c.is_ascii_digit())
            .map(|i| i + 1)
            .unwrap_or(0);
        s[start..].parse().ok()
    };

    if let Some((_, tag)) = lower.rsplit_once(':') {
        if let Some(n) = digits_before_b(tag.trim()) {
            return n;
        }
    }
    digits_before_b(lower.trim()).unwrap_or(0)
}

/// Sort models largest first. Ties keep their configured order.
pub fn sort_by_size(models: &[String]) -> Vec<String> {
    let mut sorted = models.to_vec();
    sorted.sort_by_key(|m| std::cmp::Reverse(model_size(m)));
    sorted
}

/// Build the chain: primary model first, then the sorted fallbacks
/// (without repeating the primary).
pub fn chain(primary: &str, fallbacks: &[String]) -> Vec<String> {
    let mut out = vec![primary.to_string()];
    for m in sort_by_size(fallbacks) {
        if !out.contains(&m) {
            out.push(m);
        }
    }
    out
}

/// Try each model in `models` until one produces a non-empty answer.
///
/// Returns the last error if every model fails.
pub async fn generate_with_fallback(
    provider: &dyn Provider,
    models: &[String],
    request: &GenerateRequest,
) -> Result<Generation, HimasError> {
    let mut last_err = HimasError::Provider("no models configured".to_string());

    for model in models {
        let req = request.clone().with_model(model.clone());
        match provider.generate(&req).await {
            Ok(g) if !g.text.is_empty() => return Ok(g),
            Ok(_) => {
                warn!("model {model} returned an empty response, trying next");
                last_err = HimasError::Provider(format!("{model} returned an empty response"));
            }
            Err(e) => {
                warn!("model {model} failed: {e}");
                last_err = e;
            }
        }
    }

    Err(last_err)
}
