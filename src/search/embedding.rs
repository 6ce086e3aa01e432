//! Embedding providers.
//!
//! [`Embedder`] is the contract the retrieval service consumes. Two
//! implementations ship with the crate:
//!
//! - [`GeminiEmbedder`](super::gemini::GeminiEmbedder): remote Gemini
//!   `embedContent` API.
//! - [`HtpEmbedder`]: Harmonic Token Projection, a deterministic and
//!   training-free embedding computed locally (<https://arxiv.org/html/2511.20665>).
//!   Each token is read as a base-2^16 integer, reduced modulo a set of primes,
//!   and every residue is projected onto the unit circle. Token vectors are
//!   mean-pooled and L2 normalised. It captures shared tokens, not semantics.

use async_trait::async_trait;
use std::f64::consts::PI;

use crate::core::error::Result;

/// Trait for text embedding providers.
///
/// One call per invocation, no retry; a failure surfaces as
/// [`RagError::Embedding`](crate::core::error::RagError::Embedding).
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text into a fixed-dimension vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Returns the model name, for logging.
    fn model_name(&self) -> &str;
}

/// Output dimension of [`HtpEmbedder`] (two components per modulus).
pub const HTP_DIM: usize = 384;

const NUM_MODULI: usize = HTP_DIM / 2;

/// Code points of a token that take part in its integer encoding.
const MAX_TOKEN_CHARS: usize = 64;

/// The first 192 primes.
static PRIME_MODULI: [u64; NUM_MODULI] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71,
    73, 79, 83, 89, 97, 101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151,
    157, 163, 167, 173, 179, 181, 191, 193, 197, 199, 211, 223, 227, 229, 233,
    239, 241, 251, 257, 263, 269, 271, 277, 281, 283, 293, 307, 311, 313, 317,
    331, 337, 347, 349, 353, 359, 367, 373, 379, 383, 389, 397, 401, 409, 419,
    421, 431, 433, 439, 443, 449, 457, 461, 463, 467, 479, 487, 491, 499, 503,
    509, 521, 523, 541, 547, 557, 563, 569, 571, 577, 587, 593, 599, 601, 607,
    613, 617, 619, 631, 641, 643, 647, 653, 659, 661, 673, 677, 683, 691, 701,
    709, 719, 727, 733, 739, 743, 751, 757, 761, 769, 773, 787, 797, 809, 811,
    821, 823, 827, 829, 839, 853, 857, 859, 863, 877, 881, 883, 887, 907, 911,
    919, 929, 937, 941, 947, 953, 967, 971, 977, 983, 991, 997, 1009, 1013,
    1019, 1021, 1031, 1033, 1039, 1049, 1051, 1061, 1063, 1069, 1087, 1091,
    1093, 1097, 1103, 1109, 1117, 1123, 1129, 1151, 1153, 1163,
];

/// Local deterministic embedder.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtpEmbedder;

impl HtpEmbedder {
    pub fn new() -> Self {
        Self
    }

    /// Embed synchronously. Text without tokens maps to the zero vector.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return vec![0.0; HTP_DIM];
        }

        let mut pooled = vec![0.0f64; HTP_DIM];
        for token in &tokens {
            let n = token_value(token);
            for (i, &m) in PRIME_MODULI.iter().enumerate() {
                let theta = 2.0 * PI * (n % m) as f64 / m as f64;
                pooled[2 * i] += theta.sin();
                pooled[2 * i + 1] += theta.cos();
            }
        }

        let count = tokens.len() as f64;
        pooled.iter_mut().for_each(|v| *v /= count);

        let norm = pooled.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            pooled.iter().map(|v| (v / norm) as f32).collect()
        } else {
            pooled.iter().map(|&v| v as f32).collect()
        }
    }
}

#[async_trait]
impl Embedder for HtpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_text(text))
    }

    fn model_name(&self) -> &str {
        "htp-384"
    }
}

/// Lowercased words split on whitespace and ASCII punctuation.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Token as a base-2^16 integer over its code points (wrapping).
fn token_value(token: &str) -> u64 {
    token
        .chars()
        .take(MAX_TOKEN_CHARS)
        .fold(0u64, |n, c| n.wrapping_mul(1 << 16).wrapping_add(c as u64))
}

/// Cosine similarity between two vectors.
///
/// Returns 0.0 when the lengths differ or either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a > 0.0 && norm_b > 0.0 {
        dot / (norm_a * norm_b)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_htp_deterministic() {
        let a = HtpEmbedder::new().embed_text("Tell me about a team conflict");
        let b = HtpEmbedder::new().embed_text("Tell me about a team conflict");
        let c = HtpEmbedder::new().embed_text("cooking recipes");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), HTP_DIM);
    }

    #[test]
    fn test_htp_normalized_korean() {
        let emb = HtpEmbedder::new().embed_text("팀 갈등 해결 경험?");
        let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_htp_shared_tokens_rank_higher() {
        let model = HtpEmbedder::new();
        let query = model.embed_text("team conflict resolution");
        let close = model.embed_text("conflict resolution in a team");
        let far = model.embed_text("favorite programming language");

        assert!(cosine_similarity(&query, &close) > cosine_similarity(&query, &far));
    }

    #[test]
    fn test_htp_empty_text_is_zero() {
        let emb = HtpEmbedder::new().embed_text(" ?! ");
        assert!(emb.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_tokenize_lowercases() {
        assert_eq!(tokenize("Hello, World!"), vec!["hello", "world"]);
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &[1.0, 0.0, 0.0]) - 1.0).abs() < 0.001);
        assert!(cosine_similarity(&a, &[0.0, 1.0, 0.0]).abs() < 0.001);
        assert!((cosine_similarity(&a, &[-1.0, 0.0, 0.0]) + 1.0).abs() < 0.001);
        assert_eq!(cosine_similarity(&a, &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&a, &[0.0, 0.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_trait_object_embed() {
        let embedder: Box<dyn Embedder> = Box::new(HtpEmbedder::new());
        let emb = embedder.embed("hello world").await.unwrap();
        assert_eq!(emb.len(), HTP_DIM);
        assert_eq!(embedder.model_name(), "htp-384");
    }
}
