//! Embedding vector math.

/// Dot product of two embeddings with f64 intermediate precision.
///
/// For unit-normalized vectors this equals cosine similarity. Returns
/// -1.0 (the worst possible cosine) on dimension mismatch so a registry
/// scan ranks such records last instead of aborting.
pub fn dot_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return -1.0;
    }

    let mut dot: f64 = 0.0;
    for i in 0..a.len() {
        dot += a[i] as f64 * b[i] as f64;
    }
    dot as f32
}

/// Elementwise arithmetic mean of a set of equal-length vectors.
///
/// Accumulates in f64. Returns an empty vector for empty input; the
/// commit path guards against that case before calling.
pub fn mean_embedding(vectors: &[Vec<f32>]) -> Vec<f32> {
    let Some(first) = vectors.first() else {
        return Vec::new();
    };

    let mut sum = vec![0.0f64; first.len()];
    for v in vectors {
        for (acc, &x) in sum.iter_mut().zip(v.iter()) {
            *acc += x as f64;
        }
    }

    let n = vectors.len() as f64;
    sum.into_iter().map(|x| (x / n) as f32).collect()
}

/// Scale a vector to unit L2 norm in place. Zero vectors are left as is.
///
/// Encoder implementations whose models do not normalize their output
/// can apply this at the extraction boundary so dot-product scoring
/// stays calibrated against the threshold.
pub fn l2_normalize(v: &mut [f32]) {
    let mut norm: f64 = 0.0;
    for &x in v.iter() {
        norm += (x as f64) * (x as f64);
    }
    norm = norm.sqrt();
    if norm > 0.0 {
        let scale = (1.0 / norm) as f32;
        for x in v.iter_mut() {
            *x *= scale;
        }
    }
}
