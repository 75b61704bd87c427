//! Fidelity export import.
//!
//! # Usage
//!
//! ```bash
//! # Load or refresh the fidelity repository
//! tessera import data/fidelity.json
//!
//! # Parse only, nothing is written
//! tessera import data/fidelity.json --dry-run
//! ```
//!
//! The file argument defaults to `TESSERA_FIDELITY_EXPORT`. A dry run needs no
//! database: records go to a throwaway in-memory store.

use std::path::{Path, PathBuf};

use tessera_backend::config::DEFAULT_IMPORT_BATCH_SIZE;
use tessera_backend::services::ImportSummary;
use tessera_backend::{AppError, AuthSettings, Backend, BackendConfig, ConfigError};

use super::{connect, print_json};

pub async fn run(
    config: Result<BackendConfig, ConfigError>,
    file: Option<PathBuf>,
    dry_run: bool,
) -> Result<(), AppError> {
    let summary = if dry_run {
        let config = config.ok();
        let path = resolve_path(file, config.as_ref())?;
        let batch_size = config
            .as_ref()
            .map_or(DEFAULT_IMPORT_BATCH_SIZE, |c| c.import_batch_size);
        dry_run_import(&path, batch_size).await?
    } else {
        let config = config?;
        let path = resolve_path(file, Some(&config))?;
        let backend = connect(&config).await?;
        backend.ingest().import_file(&path).await?
    };

    print_json(&summary)
}

fn resolve_path(file: Option<PathBuf>, config: Option<&BackendConfig>) -> Result<PathBuf, AppError> {
    file.or_else(|| config.and_then(|c| c.fidelity_export.clone()))
        .ok_or_else(|| {
            AppError::BadRequest(
                "no export file given and TESSERA_FIDELITY_EXPORT is not set".to_string(),
            )
        })
}

async fn dry_run_import(path: &Path, batch_size: usize) -> Result<ImportSummary, AppError> {
    let backend = Backend::in_memory_with(AuthSettings::default(), batch_size);
    let summary = backend.ingest().import_file(path).await?;
    tracing::info!(
        distinct = summary.report.distinct_cards(),
        "Dry run, nothing written"
    );
    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use super::*;

    #[tokio::test]
    async fn test_dry_run_counts_records() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "{}\n{}\n",
            r#"{"card_number":"2020000028284","cognome":"ABATANGELO","prog_spesa":"100,01"}"#,
            r#"{"card_number":"2020000031115","cognome":"ROSSI","email":"mario"rossi@example.it"}"#,
        )
        .unwrap();

        let summary = dry_run_import(file.path(), 1).await.unwrap();
        assert_eq!(summary.report.parsed, 2);
        assert_eq!(summary.report.repaired, 1);
        assert_eq!(summary.upserted, 2);
        assert_eq!(summary.batches, 2);
    }

    #[test]
    fn test_missing_path_is_bad_request() {
        assert!(matches!(
            resolve_path(None, None),
            Err(AppError::BadRequest(_))
        ));
        assert_eq!(
            resolve_path(Some(PathBuf::from("x.json")), None).unwrap(),
            PathBuf::from("x.json")
        );
    }
}
