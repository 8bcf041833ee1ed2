//! Embedding index over a single job description.
//!
//! Built fresh per job description and dropped with the evaluation that built it.
//! Read-only after `build`, so concurrent `query` calls share it without locking.

use tracing::{debug, info};

use crate::errors::AppError;
use crate::llm_client::{Embedder, LlmError};

/// Default upper bound on chunk length, in characters.
pub const DEFAULT_CHUNK_CHARS: usize = 1000;

/// One embedded slice of the job description.
#[derive(Debug, Clone)]
pub struct IndexedChunk {
    pub text: String,
    pub vector: Vec<f32>,
}

/// Text handed to the prompt as job context. Empty when nothing was retrieved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextBlock {
    pub chunks: Vec<String>,
}

impl ContextBlock {
    pub fn is_empty(&self) -> bool {
        self.chunks.iter().all(|c| c.trim().is_empty())
    }

    pub fn text(&self) -> String {
        self.chunks.join("\n\n")
    }
}

#[derive(Debug, Clone, Default)]
pub struct EmbeddingIndex {
    chunks: Vec<IndexedChunk>,
    dimension: usize,
}

impl EmbeddingIndex {
    /// Chunks and embeds `job_text`. Empty text is rejected before any backend call.
    pub async fn build(
        job_text: &str,
        embedder: &dyn Embedder,
        max_chunk_chars: usize,
    ) -> Result<Self, AppError> {
        if job_text.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "job description text cannot be empty".to_string(),
            ));
        }

        let texts = chunk_text(job_text, max_chunk_chars);
        let vectors = embedder.embed(&texts).await.map_err(embedding_error)?;

        if vectors.len() != texts.len() {
            return Err(AppError::EmbeddingService(format!(
                "expected {} vectors, backend returned {}",
                texts.len(),
                vectors.len()
            )));
        }

        let dimension = vectors.first().map(Vec::len).unwrap_or(0);
        for (i, vector) in vectors.iter().enumerate() {
            validate_vector(vector, dimension)
                .map_err(|reason| AppError::EmbeddingService(format!("chunk {i}: {reason}")))?;
        }

        let chunks: Vec<IndexedChunk> = texts
            .into_iter()
            .zip(vectors)
            .map(|(text, vector)| IndexedChunk { text, vector })
            .collect();

        info!(
            "Built job index: {} chunk(s), dimension {}",
            chunks.len(),
            dimension
        );

        Ok(Self { chunks, dimension })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Returns the `top_k` chunks most similar to `text`, best first.
    /// An empty index yields an empty block without calling the backend.
    pub async fn query(
        &self,
        text: &str,
        embedder: &dyn Embedder,
        top_k: usize,
    ) -> Result<ContextBlock, AppError> {
        if self.is_empty() || top_k == 0 {
            return Ok(ContextBlock::default());
        }

        let vectors = embedder
            .embed(&[text.to_string()])
            .await
            .map_err(embedding_error)?;
        let query = match vectors.as_slice() {
            [single] => single,
            other => {
                return Err(AppError::EmbeddingService(format!(
                    "expected 1 query vector, backend returned {}",
                    other.len()
                )))
            }
        };
        validate_vector(query, self.dimension)
            .map_err(|reason| AppError::EmbeddingService(format!("query: {reason}")))?;

        let mut scored: Vec<(usize, f32)> = self
            .chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| (i, cosine_similarity(query, &chunk.vector)))
            .collect();
        // Stable sort keeps chunk order on ties, so retrieval is deterministic.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        let chunks = scored
            .into_iter()
            .take(top_k)
            .map(|(i, score)| {
                debug!("Retrieved chunk {i} (similarity {score:.4})");
                self.chunks[i].text.clone()
            })
            .collect();

        Ok(ContextBlock { chunks })
    }
}

fn embedding_error(e: LlmError) -> AppError {
    AppError::EmbeddingService(e.to_string())
}

fn validate_vector(vector: &[f32], dimension: usize) -> Result<(), String> {
    if vector.is_empty() {
        return Err("empty embedding vector".to_string());
    }
    if vector.len() != dimension {
        return Err(format!(
            "dimension {} does not match index dimension {}",
            vector.len(),
            dimension
        ));
    }
    if vector.iter().any(|x| !x.is_finite()) {
        return Err("embedding contains non-finite values".to_string());
    }
    Ok(())
}

/// Splits text on line boundaries into chunks of at most `max_chars` characters.
/// A single line longer than the limit is split on character boundaries.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.lines().map(str::trim_end).filter(|l| !l.trim().is_empty()) {
        let line_len = line.chars().count();

        if line_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = line.chars().collect();
            chunks.extend(chars.chunks(max_chars).map(|c| c.iter().collect::<String>()));
            continue;
        }

        let added = if current.is_empty() { line_len } else { line_len + 1 };
        if current_len + added > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Cosine similarity in [-1, 1]. Zero vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::JobDescription;
    use crate::screening::test_support::{FailingEmbedder, FixedEmbedder, HashEmbedder};

    #[test]
    fn test_short_job_is_one_chunk() {
        let text = JobDescription::sample().to_document_text();
        let chunks = chunk_text(&text, DEFAULT_CHUNK_CHARS);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], text);
    }

    #[test]
    fn test_chunks_respect_limit_and_keep_lines() {
        let text = "alpha beta\ngamma delta\nepsilon zeta";
        let chunks = chunk_text(text, 22);
        assert_eq!(chunks, vec!["alpha beta\ngamma delta", "epsilon zeta"]);
    }

    #[test]
    fn test_overlong_line_is_split() {
        let chunks = chunk_text(&"x".repeat(25), 10);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_empty_job_text_rejected_before_embedding() {
        let embedder = HashEmbedder::default();
        let err = EmbeddingIndex::build("   \n ", &embedder, DEFAULT_CHUNK_CHARS)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(embedder.calls(), 0);
    }

    #[tokio::test]
    async fn test_rebuild_and_query_is_deterministic() {
        let embedder = HashEmbedder::default();
        let job = "job_title: Backend Engineer\nskills: Rust, SQL\n\
                   requirements: 3 years building services";
        let resume = "I wrote Rust services backed by SQL databases.";

        let first = EmbeddingIndex::build(job, &embedder, 30).await.unwrap();
        let second = EmbeddingIndex::build(job, &embedder, 30).await.unwrap();
        assert!(first.len() > 1);

        let a = first.query(resume, &embedder, 1).await.unwrap();
        let b = second.query(resume, &embedder, 1).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.chunks.len(), 1);
    }

    #[tokio::test]
    async fn test_query_returns_most_similar_chunk() {
        let embedder = HashEmbedder::default();
        let job = "skills: rust tokio axum\nbenefits: free lunch and parking";
        let index = EmbeddingIndex::build(job, &embedder, 35).await.unwrap();
        assert_eq!(index.len(), 2);

        let block = index
            .query("rust tokio axum developer", &embedder, 1)
            .await
            .unwrap();
        assert_eq!(block.chunks, vec!["skills: rust tokio axum"]);
    }

    #[tokio::test]
    async fn test_empty_index_returns_empty_block_without_backend_call() {
        let embedder = HashEmbedder::default();
        let index = EmbeddingIndex::default();
        let block = index.query("resume", &embedder, 1).await.unwrap();
        assert!(block.is_empty());
        assert_eq!(embedder.calls(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_embedding_error() {
        let err = EmbeddingIndex::build("job", &FailingEmbedder, DEFAULT_CHUNK_CHARS)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmbeddingService(_)));
    }

    #[tokio::test]
    async fn test_malformed_vectors_are_rejected() {
        let cases = [
            vec![],
            vec![vec![]],
            vec![vec![1.0, f32::NAN]],
        ];
        for vectors in cases {
            let embedder = FixedEmbedder::new(vectors);
            let err = EmbeddingIndex::build("job", &embedder, DEFAULT_CHUNK_CHARS)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::EmbeddingService(_)), "{err:?}");
        }
    }

    #[tokio::test]
    async fn test_query_dimension_mismatch_is_rejected() {
        let index = EmbeddingIndex::build("job", &FixedEmbedder::new(vec![vec![1.0, 0.0]]), 100)
            .await
            .unwrap();
        let err = index
            .query("resume", &FixedEmbedder::new(vec![vec![1.0, 0.0, 0.0]]), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmbeddingService(_)));
    }

    #[tokio::test]
    async fn test_concurrent_queries_share_index() {
        let embedder = std::sync::Arc::new(HashEmbedder::default());
        let index = std::sync::Arc::new(
            EmbeddingIndex::build("skills: rust\nbenefits: lunch", embedder.as_ref(), 16)
                .await
                .unwrap(),
        );

        let mut handles = Vec::new();
        for _ in 0..8 {
            let index = index.clone();
            let embedder = embedder.clone();
            handles.push(tokio::spawn(async move {
                index.query("rust", embedder.as_ref(), 1).await.unwrap()
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().chunks, vec!["skills: rust"]);
        }
    }
}
