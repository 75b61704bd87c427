//! Fidelity record normalizer.
//!
//! Turns one raw record of the bulk export ([`FidelityRecord`]) into the
//! canonical [`FidelityProfile`] consumed by card lookup and registration.
//!
//! Every output field is always present: an empty or malformed source value
//! becomes the type's default rather than disappearing, so consumers can rely
//! on a fixed shape. [`normalize`] is a pure function of its input.

pub mod coerce;
pub mod lenient;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::{TesseraError, TesseraFisica};

pub use coerce::{parse_count, parse_date, parse_decimal, parse_flag, parse_text};

/// Errors that prevent a parsed record from being normalized.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NormalizeError {
    /// The record has no `card_number`, so it cannot be keyed.
    #[error("record has no card_number")]
    MissingCardNumber,
    /// The `card_number` is present but unusable.
    #[error("invalid card_number: {0}")]
    InvalidCardNumber(#[from] TesseraError),
}

/// One raw record of the fidelity export.
///
/// Kept as an untyped JSON object: the exporter is inconsistent about value
/// types, so typing happens field by field in [`normalize`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FidelityRecord(Map<String, Value>);

impl FidelityRecord {
    /// Wrap an already parsed JSON object.
    #[must_use]
    pub const fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Raw value of a field, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Number of raw fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the record has no fields at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn text(&self, key: &str) -> String {
        coerce::parse_text(self.get(key))
    }

    fn date(&self, key: &str) -> String {
        self.get(key).map_or_else(String::new, coerce::parse_date)
    }

    fn decimal(&self, key: &str) -> f64 {
        self.get(key).map_or(0.0, coerce::parse_decimal)
    }

    fn count(&self, key: &str) -> i64 {
        self.get(key).map_or(0, coerce::parse_count)
    }

    fn flag(&self, key: &str) -> bool {
        coerce::parse_flag(self.get(key))
    }
}

impl From<Map<String, Value>> for FidelityRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Profile fields carried over from a fidelity card to a registered user.
///
/// Deserialization is lenient: each field accepts the same loose input as the
/// export (comma decimals, `"1"`/`"0"` flags, compact dates) and missing
/// fields take their default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtendedProfile {
    #[serde(deserialize_with = "lenient::text")]
    pub sesso: String,
    #[serde(deserialize_with = "lenient::date")]
    pub data_nascita: String,
    #[serde(deserialize_with = "lenient::text")]
    pub luogo_nascita: String,
    #[serde(deserialize_with = "lenient::text")]
    pub codice_fiscale: String,

    // Address
    #[serde(deserialize_with = "lenient::text")]
    pub indirizzo: String,
    #[serde(deserialize_with = "lenient::text")]
    pub cap: String,
    #[serde(deserialize_with = "lenient::text")]
    pub localita: String,
    #[serde(deserialize_with = "lenient::text")]
    pub provincia: String,
    #[serde(deserialize_with = "lenient::text")]
    pub cellulare: String,

    // Card history
    /// Code of the store that issued the card.
    #[serde(deserialize_with = "lenient::text")]
    pub codice_negozio: String,
    #[serde(deserialize_with = "lenient::date")]
    pub data_emissione: String,
    #[serde(deserialize_with = "lenient::date")]
    pub data_ultima_spesa: String,
    /// Cumulative historical spend.
    #[serde(deserialize_with = "lenient::decimal")]
    pub progressivo_spesa: f64,
    /// Spend in the current year.
    #[serde(deserialize_with = "lenient::decimal")]
    pub spesa_anno: f64,
    #[serde(deserialize_with = "lenient::count")]
    pub bollini: i64,

    // Household
    #[serde(deserialize_with = "lenient::count")]
    pub numero_figli: i64,
    #[serde(deserialize_with = "lenient::count")]
    pub numero_componenti: i64,
    #[serde(deserialize_with = "lenient::flag")]
    pub figli_minori: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub animali_cane: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub animali_gatto: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub altri_animali: bool,

    // Consents
    #[serde(deserialize_with = "lenient::flag")]
    pub consenso_privacy: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub consenso_marketing: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub consenso_profilazione: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub consenso_newsletter: bool,

    // Dietary and health
    #[serde(deserialize_with = "lenient::flag")]
    pub celiachia: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub intolleranza_lattosio: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub vegetariano: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub vegano: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub diabete: bool,
}

/// A normalized fidelity card record.
///
/// Serializes to a flat JSON object with stable field names (`nome`,
/// `cognome`, `email`, `telefono`, `localita`, `progressivo_spesa`,
/// `bollini`, ...), which is the shape card lookups hand to their callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FidelityProfile {
    pub tessera_fisica: TesseraFisica,
    #[serde(default, deserialize_with = "lenient::text")]
    pub nome: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub cognome: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub telefono: String,
    #[serde(flatten)]
    pub extended: ExtendedProfile,
}

/// Normalize one raw export record.
///
/// # Errors
///
/// Returns [`NormalizeError`] when the record has no usable `card_number`.
/// Every other field is coerced to its default instead of failing.
pub fn normalize(record: &FidelityRecord) -> Result<FidelityProfile, NormalizeError> {
    let card_number = record.text("card_number");
    if card_number.is_empty() {
        return Err(NormalizeError::MissingCardNumber);
    }
    let tessera_fisica = TesseraFisica::parse(&card_number)?;

    Ok(FidelityProfile {
        tessera_fisica,
        nome: record.text("nome"),
        cognome: record.text("cognome"),
        email: record.text("email"),
        telefono: record.text("telefono"),
        extended: ExtendedProfile {
            sesso: record.text("sesso"),
            data_nascita: record.date("data_nascita"),
            luogo_nascita: record.text("luogo_nascita"),
            codice_fiscale: record.text("codice_fiscale"),
            indirizzo: record.text("indirizzo"),
            cap: record.text("cap"),
            localita: record.text("localita"),
            provincia: record.text("provincia"),
            cellulare: record.text("cellulare"),
            codice_negozio: record.text("negozio"),
            data_emissione: record.date("data_emissione"),
            data_ultima_spesa: record.date("data_ultima_spesa"),
            progressivo_spesa: record.decimal("prog_spesa"),
            spesa_anno: record.decimal("spesa_anno"),
            bollini: record.count("bollini"),
            numero_figli: record.count("n_figli"),
            numero_componenti: record.count("n_componenti"),
            figli_minori: record.flag("figli_minori"),
            animali_cane: record.flag("animali_cane"),
            animali_gatto: record.flag("animali_gatto"),
            altri_animali: record.flag("altri_animali"),
            consenso_privacy: record.flag("flag_privacy"),
            consenso_marketing: record.flag("flag_marketing"),
            consenso_profilazione: record.flag("flag_profilazione"),
            consenso_newsletter: record.flag("flag_newsletter"),
            celiachia: record.flag("celiaco"),
            intolleranza_lattosio: record.flag("intoll_lattosio"),
            vegetariano: record.flag("vegetariano"),
            vegano: record.flag("vegano"),
            diabete: record.flag("diabetico"),
        },
    })
}
