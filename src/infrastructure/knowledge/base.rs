use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::domain::{CategorySet, DomainError, FaqEntry, FaqId, FaqMetadata};

/// One record of the FAQ dataset as it appears on disk.
#[derive(Debug, Deserialize)]
struct FaqRecord {
    #[serde(default)]
    id: Option<FaqId>,
    question: String,
    answer: String,
    category: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    source: Option<String>,
}

/// Ordered FAQ entries. Entry `i` is paired with index row `i`.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    entries: Vec<FaqEntry>,
    positions: HashMap<FaqId, usize>,
}

impl KnowledgeBase {
    /// Reads a JSON array, or one JSON object per line when the file ends in `.jsonl`.
    pub fn load(path: &Path, categories: &CategorySet) -> Result<Self, DomainError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DomainError::corrupt(format!("cannot read {}: {e}", path.display()))
        })?;

        let is_jsonl = path.extension().is_some_and(|ext| ext == "jsonl");
        let records = if is_jsonl {
            parse_jsonl(&content)?
        } else {
            serde_json::from_str::<Vec<FaqRecord>>(&content)
                .map_err(|e| DomainError::corrupt(format!("invalid FAQ dataset: {e}")))?
        };

        Self::from_records(records, categories)
    }

    pub fn from_json(content: &str, categories: &CategorySet) -> Result<Self, DomainError> {
        let records = serde_json::from_str::<Vec<FaqRecord>>(content)
            .map_err(|e| DomainError::corrupt(format!("invalid FAQ dataset: {e}")))?;
        Self::from_records(records, categories)
    }

    fn from_records(
        records: Vec<FaqRecord>,
        categories: &CategorySet,
    ) -> Result<Self, DomainError> {
        let mut entries = Vec::with_capacity(records.len());
        for (pos, record) in records.into_iter().enumerate() {
            let category = categories.parse(&record.category).ok_or_else(|| {
                DomainError::corrupt(format!(
                    "record {} has unknown category '{}'",
                    pos + 1,
                    record.category
                ))
            })?;
            entries.push(FaqEntry {
                id: record.id.unwrap_or(pos as FaqId + 1),
                question: record.question,
                answer: record.answer,
                category,
                metadata: FaqMetadata {
                    tags: record.tags,
                    source: record.source,
                },
            });
        }
        Self::from_entries(entries)
    }

    /// Fails with `CorruptKnowledgeBase` on an empty set, blank text or a repeated id.
    pub fn from_entries(entries: Vec<FaqEntry>) -> Result<Self, DomainError> {
        if entries.is_empty() {
            return Err(DomainError::corrupt("knowledge base has no entries"));
        }

        let mut positions = HashMap::with_capacity(entries.len());
        for (pos, entry) in entries.iter().enumerate() {
            if entry.question.trim().is_empty() || entry.answer.trim().is_empty() {
                return Err(DomainError::corrupt(format!(
                    "entry {} has an empty question or answer",
                    entry.id
                )));
            }
            if positions.insert(entry.id, pos).is_some() {
                return Err(DomainError::corrupt(format!(
                    "duplicate entry id {}",
                    entry.id
                )));
            }
        }

        Ok(Self { entries, positions })
    }

    pub fn get(&self, id: FaqId) -> Result<&FaqEntry, DomainError> {
        self.positions
            .get(&id)
            .map(|&pos| &self.entries[pos])
            .ok_or_else(|| DomainError::not_found(format!("FAQ entry {id}")))
    }

    pub fn position(&self, id: FaqId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    pub fn entries(&self) -> &[FaqEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_jsonl(content: &str) -> Result<Vec<FaqRecord>, DomainError> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line)
                .map_err(|e| DomainError::corrupt(format!("line {}: {e}", n + 1)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn categories() -> CategorySet {
        CategorySet::new(["account", "billing"]).unwrap()
    }

    #[test]
    fn test_assigns_positional_ids() {
        let json = r#"[
            {"question": "reset password", "answer": "Go to settings > security", "category": "account"},
            {"id": 10, "question": "refund time", "answer": "Five days", "category": "Billing"}
        ]"#;
        let kb = KnowledgeBase::from_json(json, &categories()).unwrap();

        assert_eq!(kb.len(), 2);
        assert_eq!(kb.get(1).unwrap().question, "reset password");
        assert_eq!(kb.get(10).unwrap().category.as_str(), "billing");
        assert_eq!(kb.position(10), Some(1));
    }

    #[test]
    fn test_get_unknown_is_not_found() {
        let json = r#"[{"question": "q", "answer": "a", "category": "account"}]"#;
        let kb = KnowledgeBase::from_json(json, &categories()).unwrap();
        assert!(matches!(kb.get(99), Err(DomainError::NotFound(_))));
    }

    #[test]
    fn test_rejects_corrupt_datasets() {
        let cases = [
            r#"[]"#,
            r#"[{"question": "q", "answer": "a", "category": "shipping"}]"#,
            r#"[{"question": " ", "answer": "a", "category": "account"}]"#,
            r#"[{"id": 1, "question": "q", "answer": "a", "category": "account"},
                {"id": 1, "question": "q2", "answer": "a2", "category": "account"}]"#,
            r#"{"question": "q"}"#,
        ];
        for json in cases {
            assert!(
                matches!(
                    KnowledgeBase::from_json(json, &categories()),
                    Err(DomainError::CorruptKnowledgeBase(_))
                ),
                "accepted {json}"
            );
        }
    }

    #[test]
    fn test_load_jsonl() {
        let mut file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
        writeln!(
            file,
            r#"{{"question": "reset password", "answer": "Use the link", "category": "account", "tags": ["login"]}}"#
        )
        .unwrap();
        writeln!(file).unwrap();
        writeln!(
            file,
            r#"{{"question": "invoice copy", "answer": "Billing page", "category": "billing"}}"#
        )
        .unwrap();

        let kb = KnowledgeBase::load(file.path(), &categories()).unwrap();
        assert_eq!(kb.len(), 2);
        assert_eq!(kb.get(1).unwrap().metadata.tags, vec!["login"]);
        assert_eq!(kb.get(2).unwrap().category.as_str(), "billing");
    }
}
