use std::cmp::Ordering;
use std::collections::HashSet;

use crate::domain::{DistanceMetric, DomainError, Embedding, FaqId, IndexRow};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredRow {
    pub position: usize,
    pub entry_id: FaqId,
    pub score: f32,
}

/// Immutable exact-scan vector index. Built once; a rebuild produces a new value.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    rows: Vec<IndexRow>,
    dimension: usize,
    metric: DistanceMetric,
}

impl VectorIndex {
    /// Fails with `DimensionMismatch` if rows disagree on length, and with
    /// `CorruptKnowledgeBase` on an empty row set or a repeated entry id.
    pub fn build(rows: Vec<IndexRow>, metric: DistanceMetric) -> Result<Self, DomainError> {
        let dimension = rows
            .first()
            .map(|r| r.embedding.dimension())
            .ok_or_else(|| DomainError::corrupt("cannot build an index with no rows"))?;

        if dimension == 0 {
            return Err(DomainError::corrupt("index rows have zero dimension"));
        }

        let mut seen = HashSet::with_capacity(rows.len());
        for row in &rows {
            if row.embedding.dimension() != dimension {
                return Err(DomainError::dimension_mismatch(
                    dimension,
                    row.embedding.dimension(),
                ));
            }
            if !seen.insert(row.entry_id) {
                return Err(DomainError::corrupt(format!(
                    "entry {} is indexed more than once",
                    row.entry_id
                )));
            }
        }

        Ok(Self {
            rows,
            dimension,
            metric,
        })
    }

    /// Up to `k` rows accepted by `filter`, best first, ties broken by ascending entry id.
    pub fn search<F>(
        &self,
        query: &Embedding,
        k: usize,
        filter: F,
    ) -> Result<Vec<ScoredRow>, DomainError>
    where
        F: Fn(FaqId) -> bool,
    {
        if query.dimension() != self.dimension {
            return Err(DomainError::dimension_mismatch(
                self.dimension,
                query.dimension(),
            ));
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut results: Vec<ScoredRow> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| filter(row.entry_id))
            .map(|(position, row)| ScoredRow {
                position,
                entry_id: row.entry_id,
                score: self.metric.score(query, &row.embedding),
            })
            .collect();

        results.sort_by(rank_order);
        results.truncate(k);
        Ok(results)
    }

    pub fn rows(&self) -> &[IndexRow] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }
}

fn rank_order(a: &ScoredRow, b: &ScoredRow) -> Ordering {
    match (a.score.is_nan(), b.score.is_nan()) {
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ => b
            .score
            .total_cmp(&a.score)
            .then_with(|| a.entry_id.cmp(&b.entry_id)),
    }
}
