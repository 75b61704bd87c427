//! Points commands.
//!
//! ```bash
//! tessera points credit 42 150
//! tessera points redeem 42 100
//! ```

use serde_json::json;
use tessera_backend::{AppError, BackendConfig};
use tessera_core::UserProfileId;

use super::{connect, print_json};

pub async fn credit(config: &BackendConfig, user: UserProfileId, amount: i64) -> Result<(), AppError> {
    let backend = connect(config).await?;
    let profile = backend.points().credit(user, amount).await?;
    print_json(&json!({ "user": profile.id, "punti": profile.punti }))
}

pub async fn redeem(config: &BackendConfig, user: UserProfileId, cost: i64) -> Result<(), AppError> {
    let backend = connect(config).await?;
    let profile = backend.points().redeem(user, cost).await?;
    print_json(&json!({ "user": profile.id, "punti": profile.punti }))
}
