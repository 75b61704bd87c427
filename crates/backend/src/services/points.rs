//! Points balance operations.

use thiserror::Error;

use tessera_core::UserProfileId;

use crate::db::{RepositoryError, UserStore};
use crate::models::UserProfile;

/// Errors that can occur when moving points.
#[derive(Debug, Error)]
pub enum PointsError {
    /// Amounts must be strictly positive.
    #[error("invalid amount: {0}")]
    InvalidAmount(i64),

    /// No user with this ID.
    #[error("user not found")]
    UserNotFound,

    /// The balance does not cover the cost.
    #[error("insufficient points: {available} available, {requested} requested")]
    InsufficientPoints { available: i64, requested: i64 },

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Credits and redemptions on a user's `punti` balance.
pub struct PointsService<'a> {
    users: &'a dyn UserStore,
}

impl<'a> PointsService<'a> {
    #[must_use]
    pub const fn new(users: &'a dyn UserStore) -> Self {
        Self { users }
    }

    /// Add points to a balance.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` unless `amount > 0`, `UserNotFound` for an
    /// unknown user.
    pub async fn credit(
        &self,
        user: UserProfileId,
        amount: i64,
    ) -> Result<UserProfile, PointsError> {
        if amount <= 0 {
            return Err(PointsError::InvalidAmount(amount));
        }

        let profile = self
            .users
            .credit_points(user, amount)
            .await
            .map_err(not_found)?;

        tracing::info!(user_id = %user, amount, balance = profile.punti, "points credited");
        Ok(profile)
    }

    /// Spend points on a reward.
    ///
    /// The check and the debit are one atomic step: the balance never goes
    /// negative, even under concurrent redemptions.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientPoints` (balance untouched) when the balance is
    /// lower than `cost`, `InvalidAmount` unless `cost > 0`, `UserNotFound`
    /// for an unknown user.
    pub async fn redeem(&self, user: UserProfileId, cost: i64) -> Result<UserProfile, PointsError> {
        if cost <= 0 {
            return Err(PointsError::InvalidAmount(cost));
        }

        if let Some(profile) = self
            .users
            .redeem_points(user, cost)
            .await
            .map_err(not_found)?
        {
            tracing::info!(user_id = %user, cost, balance = profile.punti, "points redeemed");
            return Ok(profile);
        }

        let available = self
            .users
            .get(user)
            .await?
            .map_or(0, |profile| profile.punti);
        tracing::info!(user_id = %user, cost, available, "redemption refused");
        Err(PointsError::InsufficientPoints {
            available,
            requested: cost,
        })
    }
}

fn not_found(e: RepositoryError) -> PointsError {
    match e {
        RepositoryError::NotFound => PointsError::UserNotFound,
        other => PointsError::Repository(other),
    }
}
