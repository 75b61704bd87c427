//! Bulk import of the fidelity export.
//!
//! The export is split, parsed and normalized on a blocking thread; finished
//! batches travel over a bounded channel to the async side, which upserts
//! them one after another. A bad record only ever costs itself: it is counted
//! in the [`IngestReport`] and the import goes on.

use std::collections::HashSet;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;

use tessera_core::{ExportReader, FidelityProfile, IngestReport};

use crate::db::{FidelityStore, RepositoryError};

/// Batches buffered between the reader thread and the writer.
const CHANNEL_DEPTH: usize = 2;

/// Errors that abort an import.
///
/// Malformed records are not errors; they end up in the report.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("read error: {0}")]
    Io(#[from] io::Error),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("reader task failed: {0}")]
    Worker(String),
}

/// Result of a finished import.
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    /// Parsing and normalization tally.
    pub report: IngestReport,
    /// Batches written.
    pub batches: usize,
    /// Rows inserted or updated.
    pub upserted: u64,
}

/// Loads and refreshes the fidelity repository from an export.
pub struct IngestService<'a> {
    fidelity: &'a dyn FidelityStore,
    batch_size: usize,
}

impl<'a> IngestService<'a> {
    #[must_use]
    pub fn new(fidelity: &'a dyn FidelityStore, batch_size: usize) -> Self {
        Self {
            fidelity,
            batch_size: batch_size.max(1),
        }
    }

    /// Import an export file.
    ///
    /// # Errors
    ///
    /// Returns `IngestError::Open` if the file cannot be opened, and any
    /// error of [`Self::import_reader`].
    pub async fn import_file(&self, path: &Path) -> Result<ImportSummary, IngestError> {
        let open = |source| IngestError::Open {
            path: path.to_path_buf(),
            source,
        };
        let file = tokio::fs::File::open(path).await.map_err(open)?;

        tracing::info!(path = %path.display(), batch_size = self.batch_size, "importing fidelity export");
        self.import_reader(file.into_std().await).await
    }

    /// Import an export from any reader.
    ///
    /// Records are upserted by card number, so importing the same export
    /// twice leaves the repository unchanged. Within one export the last
    /// record of a card wins.
    ///
    /// # Errors
    ///
    /// Returns `IngestError::Io` on a read failure and
    /// `IngestError::Repository` if a batch cannot be written; batches
    /// written before the failure stay written.
    pub async fn import_reader<R>(&self, reader: R) -> Result<ImportSummary, IngestError>
    where
        R: Read + Send + 'static,
    {
        let (tx, mut rx) = mpsc::channel::<Vec<FidelityProfile>>(CHANNEL_DEPTH);
        let batch_size = self.batch_size;

        let reader_task = tokio::task::spawn_blocking(move || -> io::Result<IngestReport> {
            let mut report = IngestReport::new();
            let mut batch = Vec::with_capacity(batch_size);

            for chunk in ExportReader::new(BufReader::new(reader)) {
                let Some(profile) = report.ingest(&chunk?) else {
                    continue;
                };
                batch.push(profile);
                if batch.len() >= batch_size && tx.blocking_send(std::mem::take(&mut batch)).is_err() {
                    // Writer gave up
                    return Ok(report);
                }
            }

            if !batch.is_empty() {
                let _ = tx.blocking_send(batch);
            }
            Ok(report)
        });

        let mut batches = 0;
        let mut upserted = 0;
        while let Some(batch) = rx.recv().await {
            let batch = dedupe_last(batch);
            upserted += self.fidelity.upsert_batch(&batch).await?;
            batches += 1;
            tracing::debug!(batch = batches, rows = batch.len(), "batch upserted");
        }

        let report = reader_task
            .await
            .map_err(|e| IngestError::Worker(e.to_string()))??;

        if report.is_complete() {
            tracing::info!(%report, upserted, "import finished");
        } else {
            tracing::warn!(
                %report,
                upserted,
                failed = report.failed(),
                rejected = report.rejected.len(),
                "import finished with skipped records"
            );
        }

        Ok(ImportSummary {
            report,
            batches,
            upserted,
        })
    }
}

/// Keep only the last record of each card, preserving order.
fn dedupe_last(batch: Vec<FidelityProfile>) -> Vec<FidelityProfile> {
    let mut seen = HashSet::new();
    let mut kept: Vec<_> = batch
        .into_iter()
        .rev()
        .filter(|profile| seen.insert(profile.tessera_fisica.clone()))
        .collect();
    kept.reverse();
    kept
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Cursor;

    use tessera_core::TesseraFisica;

    use super::*;
    use crate::db::MemoryStore;

    const EXPORT: &str = concat!(
        "[\n",
        r#"{"card_number":"2020000028284","cognome":"ABATANGELO","nome":"CHIARA","prog_spesa":"100,01","bollini":"25"},"#,
        "\n",
        r#"{"card_number":"2020000031115","cognome":"ROSSI","email":"mario"rossi@example.it","bollini":""},"#,
        "\n",
        r#"{"card_number":"2020000040001","cognome":"BIANCHI" "nome":"LUCA"},"#,
        "\n",
        r#"{"card_number":"2020000028284","cognome":"ABATANGELO","nome":"CHIARA","bollini":"30"}"#,
        "\n]\n",
    );

    fn input(text: &str) -> Cursor<Vec<u8>> {
        Cursor::new(text.as_bytes().to_vec())
    }

    fn card(number: &str) -> TesseraFisica {
        TesseraFisica::parse(number).unwrap()
    }

    #[tokio::test]
    async fn test_import_counts_and_stores() {
        let store = MemoryStore::new();
        let service = IngestService::new(&store, 2);

        let summary = service.import_reader(input(EXPORT)).await.unwrap();

        assert_eq!(summary.report.chunks, 4);
        assert_eq!(summary.report.parsed, 3);
        assert_eq!(summary.report.repaired, 1);
        assert_eq!(summary.report.failed(), 1);
        assert_eq!(summary.report.duplicates, 1);
        assert_eq!(summary.batches, 2);
        assert_eq!(store.count().await.unwrap(), 2);

        let rossi = store.get(&card("2020000031115")).await.unwrap().unwrap();
        assert_eq!(rossi.email, "mario\"rossi@example.it");

        // Later record of the same card wins
        let chiara = store.get(&card("2020000028284")).await.unwrap().unwrap();
        assert_eq!(chiara.extended.bollini, 30);
    }

    #[tokio::test]
    async fn test_import_is_idempotent() {
        let store = MemoryStore::new();
        let service = IngestService::new(&store, 500);

        service.import_reader(input(EXPORT)).await.unwrap();
        let first = store.get(&card("2020000028284")).await.unwrap();
        service.import_reader(input(EXPORT)).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
        assert_eq!(store.get(&card("2020000028284")).await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_duplicates_within_one_batch() {
        let store = MemoryStore::new();
        let service = IngestService::new(&store, 500);

        let summary = service.import_reader(input(EXPORT)).await.unwrap();
        assert_eq!(summary.batches, 1);
        assert_eq!(summary.upserted, 2);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let store = MemoryStore::new();
        let service = IngestService::new(&store, 10);

        let err = service
            .import_file(Path::new("/nonexistent/fidelity.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Open { .. }));
    }

    #[test]
    fn test_dedupe_keeps_last_in_order() {
        let profile = |n: &str, bollini| {
            let mut p = FidelityProfile {
                tessera_fisica: card(n),
                nome: String::new(),
                cognome: String::new(),
                email: String::new(),
                telefono: String::new(),
                extended: tessera_core::ExtendedProfile::default(),
            };
            p.extended.bollini = bollini;
            p
        };

        let kept = dedupe_last(vec![profile("1", 1), profile("2", 2), profile("1", 3)]);
        let summary: Vec<_> = kept
            .iter()
            .map(|p| (p.tessera_fisica.as_str(), p.extended.bollini))
            .collect();
        assert_eq!(summary, [("2", 2), ("1", 3)]);
    }
}
