use crate::state::ContentRecord;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Append-only buffer of scraped pages
///
/// Workers push, and only the overseer drains.
#[derive(Debug, Default)]
pub struct ContentSink {
    records: Mutex<Vec<ContentRecord>>,
}

impl ContentSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, record: ContentRecord) {
        self.lock().push(record);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Atomically empties the sink
    pub fn drain_all(&self) -> Vec<ContentRecord> {
        std::mem::take(&mut *self.lock())
    }

    /// Puts back records whose persistence failed, ahead of newer pushes
    pub fn restore(&self, records: Vec<ContentRecord>) {
        let mut current = self.lock();
        let newer = std::mem::replace(&mut *current, records);
        current.extend(newer);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ContentRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(name: &str) -> ContentRecord {
        ContentRecord::new(
            &format!("https://a.org/wiki/{}", name),
            name.to_string(),
            name.to_string(),
            format!("<text>{}</text>", name),
        )
    }

    #[test]
    fn test_drain_all_empties_the_sink() {
        let sink = ContentSink::new();
        sink.push(page("A"));
        sink.push(page("B"));

        let drained = sink.drain_all();
        assert_eq!(drained.len(), 2);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_restore_keeps_older_records_first() {
        let sink = ContentSink::new();
        sink.push(page("Old"));
        let drained = sink.drain_all();

        sink.push(page("New"));
        sink.restore(drained);

        let titles: Vec<String> = sink.drain_all().into_iter().map(|p| p.title).collect();
        assert_eq!(titles, vec!["Old", "New"]);
    }
}
