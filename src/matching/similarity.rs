/// Scores how likely two identifiers denote the same object.
///
/// Higher is more likely. Implementations should be reflexive (an identifier
/// scores highest against itself) and roughly symmetric.
pub trait Scorer: Send + Sync {
    /// Scores a generated identifier against a reference identifier.
    fn score(&self, generated: &str, reference: &str) -> f64;
}

/// Normalized Levenshtein similarity in `[0, 1]`, counted over Unicode
/// scalar values.
///
/// Tolerates abbreviations and punctuation differences ("Perimeter Zone 1
/// (South)" against "Prm Zone 1 (South)") while still favouring pairs that
/// share numbers and orientation words. Two empty identifiers score `1.0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Levenshtein;

impl Scorer for Levenshtein {
    fn score(&self, generated: &str, reference: &str) -> f64 {
        strsim::normalized_levenshtein(generated, reference)
    }
}
