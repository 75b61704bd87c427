//! Bulk fidelity export ingestion.
//!
//! The export is read in one pass by [`ExportReader`], each chunk is parsed
//! (with a [`repair`](repair::repair) retry) and normalized, and the outcome
//! is tallied in an [`IngestReport`]. Broken records never abort the pass:
//! they are skipped, logged, and counted separately from the parsed total.

mod reader;
pub mod repair;

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::normalize::{FidelityProfile, FidelityRecord, normalize};
use crate::types::TesseraFisica;

pub use reader::{ExportReader, RawChunk};

/// A chunk that could not be parsed, even after repair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseFailure {
    /// Position of the chunk in the export.
    pub index: usize,
    /// Byte offset of the chunk's opening brace.
    pub offset: u64,
    /// Why parsing failed.
    pub reason: String,
}

/// A record that parsed but could not be keyed by card number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejected {
    /// Position of the chunk in the export.
    pub index: usize,
    /// Why the record was rejected.
    pub reason: String,
}

/// Outcome of one ingestion pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    /// Brace-delimited chunks found in the export.
    pub chunks: usize,
    /// Chunks that parsed as JSON objects (directly or after repair).
    pub parsed: usize,
    /// Of the parsed chunks, how many needed the repair pass.
    pub repaired: usize,
    /// Profiles produced (parsed and keyed).
    pub normalized: usize,
    /// Profiles whose card was already seen earlier in the same export.
    pub duplicates: usize,
    /// Chunks dropped because they could not be parsed.
    pub failures: Vec<ParseFailure>,
    /// Records dropped because they had no usable card number.
    pub rejected: Vec<Rejected>,
    #[serde(skip)]
    seen: HashSet<TesseraFisica>,
}

impl IngestReport {
    /// Create an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse, repair if needed, and normalize one chunk, recording the outcome.
    ///
    /// Returns the normalized profile, or `None` if the chunk was dropped.
    pub fn ingest(&mut self, chunk: &RawChunk) -> Option<FidelityProfile> {
        self.chunks += 1;

        if chunk.truncated {
            self.fail(chunk, "record truncated at end of input".to_owned());
            return None;
        }

        let (record, repaired) = match parse_chunk(&chunk.text) {
            Ok(parsed) => parsed,
            Err(reason) => {
                self.fail(chunk, reason);
                return None;
            }
        };

        self.parsed += 1;
        if repaired {
            self.repaired += 1;
            tracing::debug!(index = chunk.index, offset = chunk.offset, "record repaired");
        }

        match normalize(&record) {
            Ok(profile) => {
                self.normalized += 1;
                if !self.seen.insert(profile.tessera_fisica.clone()) {
                    self.duplicates += 1;
                    tracing::debug!(
                        index = chunk.index,
                        tessera = %profile.tessera_fisica,
                        "duplicate card in export, later record wins"
                    );
                }
                Some(profile)
            }
            Err(e) => {
                tracing::warn!(index = chunk.index, error = %e, "record rejected");
                self.rejected.push(Rejected {
                    index: chunk.index,
                    reason: e.to_string(),
                });
                None
            }
        }
    }

    /// Number of chunks dropped as unparseable.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Distinct cards produced by the pass.
    #[must_use]
    pub fn distinct_cards(&self) -> usize {
        self.seen.len()
    }

    /// Whether every chunk made it through.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.rejected.is_empty()
    }

    fn fail(&mut self, chunk: &RawChunk, reason: String) {
        tracing::warn!(
            index = chunk.index,
            offset = chunk.offset,
            reason = %reason,
            "skipping unparseable record"
        );
        self.failures.push(ParseFailure {
            index: chunk.index,
            offset: chunk.offset,
            reason,
        });
    }
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} chunks: {} parsed ({} repaired), {} failed, {} rejected, {} distinct cards ({} duplicates)",
            self.chunks,
            self.parsed,
            self.repaired,
            self.failures.len(),
            self.rejected.len(),
            self.seen.len(),
            self.duplicates,
        )
    }
}

/// Parse one chunk, retrying once through [`repair::repair`].
///
/// Returns the record and whether the repair pass was needed.
fn parse_chunk(text: &str) -> Result<(FidelityRecord, bool), String> {
    match serde_json::from_str::<FidelityRecord>(text) {
        Ok(record) => Ok((record, false)),
        Err(original) => {
            let Some(fixed) = repair::repair(text) else {
                return Err(original.to_string());
            };
            serde_json::from_str::<FidelityRecord>(&fixed)
                .map(|record| (record, true))
                .map_err(|e| format!("{original} (after repair: {e})"))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn run(input: &str) -> (IngestReport, Vec<FidelityProfile>) {
        let mut report = IngestReport::new();
        let profiles = ExportReader::new(Cursor::new(input.as_bytes().to_vec()))
            .map(Result::unwrap)
            .filter_map(|chunk| report.ingest(&chunk))
            .collect();
        (report, profiles)
    }

    #[test]
    fn test_clean_export() {
        let (report, profiles) = run(concat!(
            r#"{"card_number":"2020000028284","cognome":"ABATANGELO","nome":"CHIARA","prog_spesa":"100,01","bollini":"25"}"#,
            "\n",
            r#"{"card_number":"2020000031115","cognome":"ROSSI","nome":"MARIO","prog_spesa":"","bollini":""}"#,
        ));

        assert_eq!(report.chunks, 2);
        assert_eq!(report.parsed, 2);
        assert_eq!(report.normalized, 2);
        assert!(report.is_complete());
        assert_eq!(profiles[0].extended.bollini, 25);
        assert!(profiles[1].extended.progressivo_spesa.abs() < f64::EPSILON);
    }

    #[test]
    fn test_broken_email_is_repaired() {
        let (report, profiles) = run(
            r#"{"card_number":"2020000028284","email":"chiara"abatangelo@example.it","cognome":"ABATANGELO"}"#,
        );

        assert_eq!(report.parsed, 1);
        assert_eq!(report.repaired, 1);
        assert_eq!(profiles[0].email, "chiara\"abatangelo@example.it");
        assert_eq!(profiles[0].cognome, "ABATANGELO");
    }

    #[test]
    fn test_failures_are_counted_separately() {
        let (report, profiles) = run(concat!(
            r#"{"card_number":"1","nome":"A"}"#,
            r#"{"card_number":"2" "nome":"B"}"#,
            r#"{"card_number":"3","nome":"C"}"#,
            r#"{"nome":"no card"}"#,
            r#"{"card_number":"4","#,
        ));

        assert_eq!(report.chunks, 5);
        assert_eq!(report.parsed, 3);
        assert_eq!(report.normalized, 2);
        assert_eq!(report.failed(), 2);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.failures[0].index, 1);
        assert_eq!(report.failures[1].reason, "record truncated at end of input");
        assert_eq!(profiles.len(), 2);
        assert!(!report.is_complete());
    }

    #[test]
    fn test_braces_in_values_keep_records_apart() {
        let (report, profiles) = run(concat!(
            r#"{"card_number":"1","indirizzo":"VIA ROMA {INT 3","nome":"A"}"#,
            "\n",
            r#"{"card_number":"2","note":"a} b","nome":"B"}"#,
            "\n",
            r#"{"card_number":"3","nome":"C"}"#,
            "\n",
            r#"{"card_number":"4","nome":"D"}"#,
        ));

        assert_eq!(report.chunks, 4);
        assert_eq!(report.parsed, 4);
        assert_eq!(report.failed(), 0);
        assert!(report.is_complete());
        assert_eq!(profiles[0].extended.indirizzo, "VIA ROMA {INT 3");
        assert_eq!(profiles[1].nome, "B");
        assert_eq!(profiles[3].tessera_fisica.as_str(), "4");
    }

    #[test]
    fn test_duplicates_are_counted() {
        let (report, profiles) = run(concat!(
            r#"{"card_number":"1","bollini":"1"}"#,
            r#"{"card_number":"1","bollini":"2"}"#,
        ));

        assert_eq!(report.duplicates, 1);
        assert_eq!(report.distinct_cards(), 1);
        assert_eq!(profiles.len(), 2);
    }

    #[test]
    fn test_report_serializes_without_internal_state() {
        let (report, _) = run(r#"{"card_number":"1"}"#);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["normalized"], 1);
        assert!(value.get("seen").is_none());
    }
}
