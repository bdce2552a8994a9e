//! Vector math shared by clustering and scoring.

use crate::error::EmbeddingError;

use super::types::Embedding;

/// Cosine similarity in f64.
///
/// Returns 0.0 when either vector has zero norm, when the lengths differ, or
/// when either is empty. The result is not clamped.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = f64::from(*x);
        let y = f64::from(*y);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return 0.0;
    }
    dot / denom
}

pub fn squared_euclidean(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = f64::from(*x) - f64::from(*y);
            d * d
        })
        .sum()
}

/// Strictly decode a textual embedding: a JSON array of finite numbers.
///
/// Anything else (objects, nested arrays, quoted numbers, trailing garbage,
/// values that overflow f32) is rejected; no code is ever evaluated.
pub fn decode_embedding(encoded: &str) -> Result<Embedding, EmbeddingError> {
    let values: Vec<f64> = serde_json::from_str(encoded.trim())
        .map_err(|e| EmbeddingError::Decode(e.to_string()))?;
    if values.is_empty() {
        return Err(EmbeddingError::Decode("empty array".into()));
    }
    #[allow(clippy::cast_possible_truncation)]
    let vector: Embedding = values.iter().map(|v| *v as f32).collect();
    if vector.iter().any(|x| !x.is_finite()) {
        return Err(EmbeddingError::Decode("non-finite component".into()));
    }
    Ok(vector)
}

pub fn zero_vector(dims: usize) -> Embedding {
    vec![0.0; dims]
}
