use crate::models::{ForwardRequest, HistoryEntry, MAX_HISTORY_SIZE};
use crate::store::{DocumentKey, JsonStore};
use chrono::{SecondsFormat, Utc};
use tracing::debug;

/// Newest-first log of forwarding attempts, capped at `MAX_HISTORY_SIZE`.
#[derive(Debug, Clone)]
pub struct HistoryRecorder {
    store: JsonStore,
}

impl HistoryRecorder {
    pub fn new(store: JsonStore) -> Self {
        Self { store }
    }

    /// Stores the attempt's input parameters and persists the list right away.
    pub async fn record(&self, request: &ForwardRequest) -> HistoryEntry {
        self.record_at(request, timestamp_now()).await
    }

    /// Like `record`, with a timestamp captured by the caller when the attempt started.
    pub async fn record_at(&self, request: &ForwardRequest, timestamp: String) -> HistoryEntry {
        let entry = HistoryEntry::from_request(request, timestamp);

        let total = self
            .store
            .update(DocumentKey::History, Vec::new(), |entries: &mut Vec<HistoryEntry>| {
                entries.insert(0, entry.clone());
                entries.truncate(MAX_HISTORY_SIZE);
                entries.len()
            })
            .await;

        debug!(url = %entry.url, method = %entry.method, total, "Recorded history entry");
        entry
    }

    pub async fn list(&self) -> Vec<HistoryEntry> {
        self.store.load(DocumentKey::History, Vec::new()).await
    }
}

/// Current UTC time as ISO-8601 with a `Z` suffix.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use tempfile::TempDir;

    fn create_test_recorder() -> (HistoryRecorder, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonStore::open(temp_dir.path()).unwrap();
        (HistoryRecorder::new(store), temp_dir)
    }

    #[tokio::test]
    async fn test_record_stores_input_parameters() {
        let (recorder, _temp_dir) = create_test_recorder();
        let mut request = ForwardRequest::new("https://example.test/get");
        request.method = "get".to_string();
        request.proxy = true;

        let before = Utc::now();
        let entry = recorder.record(&request).await;
        let after = Utc::now();

        assert_eq!(entry.url, "https://example.test/get");
        assert_eq!(entry.method, "GET");
        assert!(entry.proxy);
        assert!(entry.timestamp.ends_with('Z'));
        let recorded_at = DateTime::parse_from_rfc3339(&entry.timestamp)
            .unwrap()
            .timestamp_micros();
        assert!(recorded_at >= before.timestamp_micros());
        assert!(recorded_at <= after.timestamp_micros());

        assert_eq!(recorder.list().await, vec![entry]);
    }

    #[tokio::test]
    async fn test_history_is_capped_and_newest_first() {
        let (recorder, _temp_dir) = create_test_recorder();

        for i in 0..=MAX_HISTORY_SIZE {
            recorder
                .record(&ForwardRequest::new(format!("https://example.test/{i}")))
                .await;
        }

        let entries = recorder.list().await;
        assert_eq!(entries.len(), MAX_HISTORY_SIZE);
        assert_eq!(entries[0].url, format!("https://example.test/{MAX_HISTORY_SIZE}"));
        assert_eq!(entries[MAX_HISTORY_SIZE - 1].url, "https://example.test/1");
        assert!(entries.iter().all(|e| e.url != "https://example.test/0"));
    }

    #[tokio::test]
    async fn test_record_at_keeps_given_timestamp() {
        let (recorder, _temp_dir) = create_test_recorder();

        let entry = recorder
            .record_at(
                &ForwardRequest::new("https://example.test"),
                "2024-05-01T08:30:00.000001Z".to_string(),
            )
            .await;

        assert_eq!(entry.timestamp, "2024-05-01T08:30:00.000001Z");
        assert_eq!(recorder.list().await[0].timestamp, entry.timestamp);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_records_are_all_kept() {
        let (recorder, _temp_dir) = create_test_recorder();

        let tasks: Vec<_> = (0..10)
            .map(|i| {
                let recorder = recorder.clone();
                tokio::spawn(async move {
                    recorder
                        .record(&ForwardRequest::new(format!("https://example.test/{i}")))
                        .await;
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let mut urls: Vec<String> = recorder.list().await.into_iter().map(|e| e.url).collect();
        urls.sort();
        let mut expected: Vec<String> = (0..10).map(|i| format!("https://example.test/{i}")).collect();
        expected.sort();
        assert_eq!(urls, expected);
    }

    #[tokio::test]
    async fn test_null_fields_in_stored_history_fall_back_to_defaults() {
        let (recorder, temp_dir) = create_test_recorder();
        std::fs::write(
            temp_dir.path().join(DocumentKey::History.file_name()),
            r#"[
                {"timestamp": null, "url": "https://example.test/a", "method": null, "headers": "", "body": "", "proxy": null},
                {"timestamp": "2024-01-01T00:00:00Z", "url": "https://example.test/b", "method": "POST", "headers": "", "body": "", "proxy": true}
            ]"#,
        )
        .unwrap();

        let entries = recorder.list().await;

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].timestamp, "");
        assert_eq!(entries[0].method, "GET");
        assert!(!entries[0].proxy);
        assert_eq!(entries[1].url, "https://example.test/b");
    }

    #[tokio::test]
    async fn test_list_reloads_from_disk() {
        let (recorder, temp_dir) = create_test_recorder();
        recorder.record(&ForwardRequest::new("https://example.test/a")).await;

        let other = HistoryRecorder::new(JsonStore::open(temp_dir.path()).unwrap());
        other.record(&ForwardRequest::new("https://example.test/b")).await;

        let urls: Vec<String> = recorder.list().await.into_iter().map(|e| e.url).collect();
        assert_eq!(urls, vec!["https://example.test/b", "https://example.test/a"]);
    }
}
