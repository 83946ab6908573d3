use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use support_agent::domain::ports::EmbeddingService;
use support_agent::domain::{CategorySet, DistanceMetric, DomainError, Embedding, IndexRow};
use support_agent::infrastructure::config::KnowledgeConfig;
use support_agent::infrastructure::index::codec;
use support_agent::infrastructure::{
    HashingEmbedding, KnowledgeBase, KnowledgeSnapshot, SnapshotLoader, SnapshotStore,
    VectorIndex,
};
use tempfile::TempDir;

const FAQ: &str = r#"[
    {"question": "How do I reset my password?", "answer": "Go to settings > security.", "category": "account"},
    {"question": "Where is my invoice?", "answer": "Invoices are under Orders > Order Details.", "category": "billing"},
    {"question": "How long does shipping take?", "answer": "Standard shipping takes 3 to 7 business days.", "category": "shipping"}
]"#;

fn categories() -> CategorySet {
    CategorySet::new(["account", "billing", "shipping"]).unwrap()
}

fn write_faq(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("faq.json");
    std::fs::File::create(&path)
        .unwrap()
        .write_all(content.as_bytes())
        .unwrap();
    path
}

fn loader(faq_path: &Path, index_path: Option<PathBuf>, dimension: usize) -> SnapshotLoader {
    SnapshotLoader::new(
        KnowledgeConfig {
            faq_path: faq_path.to_path_buf(),
            index_path,
            build_if_missing: true,
        },
        DistanceMetric::Cosine,
        categories(),
        Arc::new(HashingEmbedding::new(dimension)),
    )
}

#[tokio::test]
async fn test_first_start_builds_and_persists_then_loads() {
    let dir = TempDir::new().unwrap();
    let faq = write_faq(&dir, FAQ);
    let index_path = dir.path().join("nested").join("faq.index");

    let built = loader(&faq, Some(index_path.clone()), 64)
        .load_or_build()
        .await
        .unwrap();
    assert!(index_path.exists());
    assert_eq!(built.knowledge().len(), 3);
    assert_eq!(built.dimension(), 64);

    let loaded = loader(&faq, Some(index_path), 64)
        .load_or_build()
        .await
        .unwrap();
    assert_eq!(loaded.index().rows(), built.index().rows());
    assert_eq!(loaded.index().metric(), DistanceMetric::Cosine);
    assert_eq!(loaded.embedding_model(), "hashing-fnv1a-64");
}

#[tokio::test]
async fn test_positional_ids_when_dataset_has_none() {
    let dir = TempDir::new().unwrap();
    let faq = write_faq(&dir, FAQ);
    let snapshot = loader(&faq, None, 32).load_or_build().await.unwrap();

    let ids: Vec<u64> = snapshot.knowledge().entries().iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_persisted_index_of_other_dimension_is_rejected() {
    let dir = TempDir::new().unwrap();
    let faq = write_faq(&dir, FAQ);
    let index_path = dir.path().join("faq.index");

    loader(&faq, Some(index_path.clone()), 64)
        .load_or_build()
        .await
        .unwrap();
    let err = loader(&faq, Some(index_path), 128)
        .load_or_build()
        .await
        .unwrap_err();

    assert_eq!(err, DomainError::dimension_mismatch(128, 64));
    assert!(err.is_fatal());
}

/// Same vectors as the hashing provider under another model name.
struct RenamedEmbedding {
    inner: HashingEmbedding,
    model: &'static str,
}

#[async_trait]
impl EmbeddingService for RenamedEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        self.inner.embed(text).await
    }

    async fn embed_many(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        self.inner.embed_many(texts).await
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn model_name(&self) -> &str {
        self.model
    }
}

fn renamed_loader(faq_path: &Path, index_path: PathBuf, build_if_missing: bool) -> SnapshotLoader {
    SnapshotLoader::new(
        KnowledgeConfig {
            faq_path: faq_path.to_path_buf(),
            index_path: Some(index_path),
            build_if_missing,
        },
        DistanceMetric::Cosine,
        categories(),
        Arc::new(RenamedEmbedding {
            inner: HashingEmbedding::new(16),
            model: "other-model",
        }),
    )
}

#[tokio::test]
async fn test_index_from_other_model_is_rejected_without_build() {
    let dir = TempDir::new().unwrap();
    let faq = write_faq(&dir, FAQ);
    let index_path = dir.path().join("faq.index");
    loader(&faq, Some(index_path.clone()), 16)
        .load_or_build()
        .await
        .unwrap();

    let err = renamed_loader(&faq, index_path, false)
        .load_or_build()
        .await
        .unwrap_err();
    assert!(
        matches!(&err, DomainError::CorruptKnowledgeBase(msg) if msg.contains("hashing-fnv1a-16") && msg.contains("other-model"))
    );
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_index_from_other_model_is_rebuilt_when_allowed() {
    let dir = TempDir::new().unwrap();
    let faq = write_faq(&dir, FAQ);
    let index_path = dir.path().join("faq.index");
    loader(&faq, Some(index_path.clone()), 16)
        .load_or_build()
        .await
        .unwrap();

    let snapshot = renamed_loader(&faq, index_path.clone(), true)
        .load_or_build()
        .await
        .unwrap();
    assert_eq!(snapshot.embedding_model(), "other-model");
    assert_eq!(codec::load(&index_path).unwrap().embedding_model, "other-model");
}

#[test]
fn test_readers_never_observe_a_partial_save() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("faq.index");
    let rows = (1..=2_000u64)
        .map(|id| IndexRow::new(id, Embedding::new(vec![id as f32; 32])))
        .collect();
    let index = VectorIndex::build(rows, DistanceMetric::Cosine).unwrap();
    codec::save(&index, "m", &path).unwrap();

    std::thread::scope(|s| {
        s.spawn(|| {
            for _ in 0..20 {
                codec::save(&index, "m", &path).unwrap();
            }
        });
        for _ in 0..100 {
            let persisted = codec::load(&path).unwrap();
            assert_eq!(persisted.index.row_count(), 2_000);
        }
    });
}

#[tokio::test]
async fn test_newer_format_version_is_incompatible() {
    let dir = TempDir::new().unwrap();
    let faq = write_faq(&dir, FAQ);
    let index_path = dir.path().join("faq.index");
    loader(&faq, Some(index_path.clone()), 16)
        .load_or_build()
        .await
        .unwrap();

    let mut bytes = std::fs::read(&index_path).unwrap();
    bytes[4..8].copy_from_slice(&(codec::FORMAT_VERSION + 1).to_le_bytes());
    std::fs::write(&index_path, &bytes).unwrap();

    let err = loader(&faq, Some(index_path), 16)
        .load_or_build()
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::IncompatibleIndexVersion {
            found: 3,
            supported: 2
        }
    ));
}

#[tokio::test]
async fn test_truncated_index_is_corrupt() {
    let dir = TempDir::new().unwrap();
    let faq = write_faq(&dir, FAQ);
    let index_path = dir.path().join("faq.index");
    loader(&faq, Some(index_path.clone()), 16)
        .load_or_build()
        .await
        .unwrap();

    let bytes = std::fs::read(&index_path).unwrap();
    std::fs::write(&index_path, &bytes[..bytes.len() - 3]).unwrap();

    let err = loader(&faq, Some(index_path), 16)
        .load_or_build()
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::CorruptKnowledgeBase(_)));
}

#[tokio::test]
async fn test_index_out_of_step_with_dataset_is_corrupt() {
    let dir = TempDir::new().unwrap();
    let faq = write_faq(&dir, FAQ);
    let index_path = dir.path().join("faq.index");
    loader(&faq, Some(index_path.clone()), 16)
        .load_or_build()
        .await
        .unwrap();

    let shorter = r#"[
        {"question": "How do I reset my password?", "answer": "Go to settings > security.", "category": "account"}
    ]"#;
    write_faq(&dir, shorter);

    let err = loader(&faq, Some(index_path), 16)
        .load_or_build()
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::CorruptKnowledgeBase(_)));
}

#[tokio::test]
async fn test_missing_index_without_build_is_fatal() {
    let dir = TempDir::new().unwrap();
    let faq = write_faq(&dir, FAQ);
    let loader = SnapshotLoader::new(
        KnowledgeConfig {
            faq_path: faq,
            index_path: Some(dir.path().join("absent.index")),
            build_if_missing: false,
        },
        DistanceMetric::Cosine,
        categories(),
        Arc::new(HashingEmbedding::new(16)),
    );

    let err = loader.load_or_build().await.unwrap_err();
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_unknown_category_in_dataset_is_corrupt() {
    let dir = TempDir::new().unwrap();
    let faq = write_faq(
        &dir,
        r#"[{"question": "Do you sell gift cards?", "answer": "Yes.", "category": "gifts"}]"#,
    );
    let err = loader(&faq, None, 16).load_or_build().await.unwrap_err();
    assert!(matches!(err, DomainError::CorruptKnowledgeBase(msg) if msg.contains("gifts")));
}

#[tokio::test]
async fn test_reload_swaps_in_new_dataset() {
    let dir = TempDir::new().unwrap();
    let faq = write_faq(&dir, FAQ);
    let loader = loader(&faq, Some(dir.path().join("faq.index")), 32);
    let store = SnapshotStore::new(loader.load_or_build().await.unwrap());
    let before = store.current().unwrap();

    let extended = r#"[
        {"question": "How do I reset my password?", "answer": "Go to settings > security.", "category": "account"},
        {"question": "Where is my invoice?", "answer": "Invoices are under Orders > Order Details.", "category": "billing"},
        {"question": "How long does shipping take?", "answer": "Standard shipping takes 3 to 7 business days.", "category": "shipping"},
        {"question": "Do you ship abroad?", "answer": "We ship to over 40 countries.", "category": "shipping"}
    ]"#;
    write_faq(&dir, extended);

    let after = loader.reload(&store).await.unwrap();
    assert_eq!(after.knowledge().len(), 4);
    assert_eq!(before.knowledge().len(), 3);
    assert_eq!(store.current().unwrap().knowledge().len(), 4);
}

#[tokio::test]
async fn test_codec_file_round_trip_keeps_search_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rows.index");
    let embedding = HashingEmbedding::new(256);
    let texts = ["reset password", "download invoice", "track package"];
    let rows = embedding
        .embed_many(&texts)
        .await
        .unwrap()
        .into_iter()
        .enumerate()
        .map(|(i, v)| IndexRow::new(i as u64 + 10, v))
        .collect();
    let index = VectorIndex::build(rows, DistanceMetric::DotProduct).unwrap();

    codec::save(&index, embedding.model_name(), &path).unwrap();
    let persisted = codec::load(&path).unwrap();
    assert_eq!(persisted.embedding_model, "hashing-fnv1a-256");
    let loaded = persisted.index;

    let query = embedding.embed("invoice").await.unwrap();
    let expected: Vec<u64> = index
        .search(&query, 3, |_| true)
        .unwrap()
        .iter()
        .map(|r| r.entry_id)
        .collect();
    let actual: Vec<u64> = loaded
        .search(&query, 3, |_| true)
        .unwrap()
        .iter()
        .map(|r| r.entry_id)
        .collect();
    assert_eq!(expected, actual);
    assert_eq!(expected[0], 11);
}

#[test]
fn test_snapshot_rejects_misaligned_rows() {
    let knowledge = KnowledgeBase::from_json(FAQ, &categories()).unwrap();
    let rows = vec![
        IndexRow::new(2, Embedding::new(vec![1.0, 0.0])),
        IndexRow::new(1, Embedding::new(vec![0.0, 1.0])),
        IndexRow::new(3, Embedding::new(vec![1.0, 1.0])),
    ];
    let index = VectorIndex::build(rows, DistanceMetric::Cosine).unwrap();
    let err = KnowledgeSnapshot::new(knowledge, index, "test").unwrap_err();
    assert!(matches!(err, DomainError::CorruptKnowledgeBase(_)));
}
