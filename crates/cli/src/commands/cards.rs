//! Card lookup, registration and card migration commands.
//!
//! # Usage
//!
//! ```bash
//! tessera check 2020000028284 --surname Abatangelo
//! tessera register -e mario@example.it -p secret123 --nome MARIO --profile '{"localita":"MILANO"}'
//! tessera migrate-card 2020000028284 -s Abatangelo -e chiara@example.it -p secret123
//! ```

use serde_json::{Map, Value};
use tessera_backend::models::NewRegistration;
use tessera_backend::{AppError, BackendConfig};

use super::{connect, print_json};
use crate::RegisterArgs;

/// Print the lookup outcome, e.g. `{"status":"FOUND","data":{...}}`.
pub async fn check(
    config: &BackendConfig,
    tessera: &str,
    surname: Option<&str>,
) -> Result<(), AppError> {
    let backend = connect(config).await?;
    let outcome = backend.matcher().check(tessera, surname).await?;
    print_json(&outcome)
}

pub async fn register(config: &BackendConfig, args: RegisterArgs) -> Result<(), AppError> {
    let input = registration_input(args)?;
    let backend = connect(config).await?;
    let user = backend.registration().register(input).await?;
    print_json(&user)
}

pub async fn migrate_card(
    config: &BackendConfig,
    tessera: &str,
    surname: Option<&str>,
    email: &str,
    password: &str,
) -> Result<(), AppError> {
    let backend = connect(config).await?;
    let user = backend
        .registration()
        .migrate(tessera, surname, email, password)
        .await?;
    print_json(&user)
}

/// Merge the named arguments over the `--profile` object.
fn registration_input(args: RegisterArgs) -> Result<NewRegistration, AppError> {
    let mut fields = match args.profile.as_deref() {
        Some(json) => match serde_json::from_str::<Value>(json) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                return Err(AppError::BadRequest(
                    "--profile must be a JSON object".to_string(),
                ));
            }
            Err(e) => return Err(AppError::BadRequest(format!("invalid --profile: {e}"))),
        },
        None => Map::new(),
    };

    fields.insert("email".to_owned(), Value::String(args.email));
    fields.insert("password".to_owned(), Value::String(args.password));
    fields.insert("nome".to_owned(), Value::String(args.nome));
    fields.insert("cognome".to_owned(), Value::String(args.cognome));
    fields.insert("telefono".to_owned(), Value::String(args.telefono));
    if let Some(tessera) = args.tessera {
        fields.insert("tessera_fisica".to_owned(), Value::String(tessera));
    }

    serde_json::from_value(Value::Object(fields))
        .map_err(|e| AppError::BadRequest(format!("invalid profile field: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn args(profile: Option<&str>) -> RegisterArgs {
        RegisterArgs {
            email: "mario@example.it".to_owned(),
            password: "correct-horse".to_owned(),
            tessera: Some("2020000031115".to_owned()),
            nome: "MARIO".to_owned(),
            cognome: "ROSSI".to_owned(),
            telefono: String::new(),
            profile: profile.map(str::to_owned),
        }
    }

    #[test]
    fn test_profile_fields_are_coerced() {
        let input = registration_input(args(Some(
            r#"{"localita":"MILANO","spesa_anno":"1.980,53","vegano":"1","nome":"IGNORED"}"#,
        )))
        .unwrap();

        assert_eq!(input.nome, "MARIO");
        assert_eq!(input.tessera_fisica.as_deref(), Some("2020000031115"));
        assert_eq!(input.extended.localita, "MILANO");
        assert!((input.extended.spesa_anno - 1980.53).abs() < 1e-9);
        assert!(input.extended.vegano);
    }

    #[test]
    fn test_profile_must_be_object() {
        assert!(matches!(
            registration_input(args(Some("[1, 2]"))),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            registration_input(args(Some("{not json"))),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_without_profile() {
        let input = registration_input(args(None)).unwrap();
        assert_eq!(input.extended.bollini, 0);
        assert!(!input.extended.consenso_privacy);
    }
}
