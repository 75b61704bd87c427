//! Import and card lookup against `PostgreSQL`.
//!
//! Run with: cargo test -p tessera-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::io::Cursor;

use serde_json::Value;
use tessera_core::{TesseraFisica, TesseraMatch};
use tessera_integration_tests::{backend, export_record, unique_card};

fn export(lines: &[String]) -> Cursor<Vec<u8>> {
    Cursor::new(lines.join("\n").into_bytes())
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TESSERA_TEST_DATABASE_URL)"]
async fn test_import_is_idempotent() {
    let backend = backend().await;
    let card = unique_card();
    let lines = [export_record(&card, "ROSSI", "25")];

    let first = backend.ingest().import_reader(export(&lines)).await.unwrap();
    let stored = backend
        .fidelity()
        .get(&TesseraFisica::parse(&card).unwrap())
        .await
        .unwrap();
    let second = backend.ingest().import_reader(export(&lines)).await.unwrap();
    let again = backend
        .fidelity()
        .get(&TesseraFisica::parse(&card).unwrap())
        .await
        .unwrap();

    assert_eq!(first.upserted, 1);
    assert_eq!(second.upserted, 1);
    assert!(stored.is_some());
    assert_eq!(stored, again);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TESSERA_TEST_DATABASE_URL)"]
async fn test_reimport_refreshes_record() {
    let backend = backend().await;
    let card = unique_card();

    backend
        .ingest()
        .import_reader(export(&[export_record(&card, "ROSSI", "25")]))
        .await
        .unwrap();
    backend
        .ingest()
        .import_reader(export(&[export_record(&card, "ROSSI", "40")]))
        .await
        .unwrap();

    let profile = backend
        .fidelity()
        .get(&TesseraFisica::parse(&card).unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.extended.bollini, 40);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TESSERA_TEST_DATABASE_URL)"]
async fn test_lookup_states() {
    let backend = backend().await;
    let card = unique_card();
    backend
        .ingest()
        .import_reader(export(&[export_record(&card, "Abatangelo", "25")]))
        .await
        .unwrap();

    let matcher = backend.matcher();
    let found = matcher.check(&card, Some("ABATANGELO")).await.unwrap();
    let wire: Value = serde_json::to_value(&found).unwrap();
    assert_eq!(wire["status"], "FOUND");
    assert_eq!(wire["data"]["bollini"], 25);
    assert_eq!(wire["data"]["numero_figli"], 0);
    assert_eq!(wire["data"]["consenso_privacy"], true);
    assert!((wire["data"]["progressivo_spesa"].as_f64().unwrap() - 1980.53).abs() < 1e-9);

    assert_eq!(
        matcher.check(&card, Some("Rossi")).await.unwrap(),
        TesseraMatch::SurnameMismatch
    );
    assert_eq!(
        matcher.check(&unique_card(), None).await.unwrap(),
        TesseraMatch::NotFound
    );
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TESSERA_TEST_DATABASE_URL)"]
async fn test_broken_records_are_counted_not_fatal() {
    let backend = backend().await;
    let good = unique_card();
    let repaired = unique_card();
    let lines = [
        export_record(&good, "ROSSI", "1"),
        format!(r#"{{"card_number":"{repaired}","cognome":"BIANCHI","email":"luca"bianchi@example.it"}}"#),
        r#"{"card_number": }"#.to_owned(),
    ];

    let summary = backend.ingest().import_reader(export(&lines)).await.unwrap();

    assert_eq!(summary.report.parsed, 2);
    assert_eq!(summary.report.repaired, 1);
    assert_eq!(summary.report.failed(), 1);
    assert!(!summary.report.is_complete());
    assert!(
        backend
            .fidelity()
            .get(&TesseraFisica::parse(&repaired).unwrap())
            .await
            .unwrap()
            .is_some()
    );
}
