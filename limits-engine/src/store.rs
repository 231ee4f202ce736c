//! Limits store: per-customer limit configuration.

use crate::error::{Error, Result};
use crate::types::{LimitsUpdate, UserLimits};
use account_core::UserId;
use dashmap::DashMap;
use rust_decimal::Decimal;

/// Offsets outside UTC-12:00..UTC+14:00 do not exist.
const MIN_UTC_OFFSET_MINUTES: i32 = -720;
const MAX_UTC_OFFSET_MINUTES: i32 = 840;

/// Concurrent store of per-customer limits.
///
/// Every customer that can move money has a record here; it is
/// provisioned at onboarding and only mutated through validated
/// updates.
#[derive(Debug, Default)]
pub struct LimitsStore {
    limits: DashMap<UserId, UserLimits>,
}

impl LimitsStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the limits record for a user, replacing any previous
    /// one.
    pub fn provision(&self, user: UserId, limits: UserLimits) -> Result<()> {
        validate_limits(&limits)?;
        self.limits.insert(user, limits);
        tracing::debug!(user = %user, "Limits provisioned");
        Ok(())
    }

    /// The user's current limits.
    pub fn get(&self, user: UserId) -> Result<UserLimits> {
        self.limits
            .get(&user)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::NotConfigured(user.to_string()))
    }

    /// Whether the user has a limits record.
    pub fn contains(&self, user: UserId) -> bool {
        self.limits.contains_key(&user)
    }

    /// Apply a partial update atomically, returning the new limits.
    pub fn update(&self, user: UserId, update: LimitsUpdate) -> Result<UserLimits> {
        let mut entry = self
            .limits
            .get_mut(&user)
            .ok_or_else(|| Error::NotConfigured(user.to_string()))?;

        let mut next = entry.value().clone();
        if let Some(v) = update.transaction_limit {
            next.transaction_limit = v;
        }
        if let Some(v) = update.daily_transaction_limit {
            next.daily_transaction_limit = v;
        }
        if let Some(v) = update.absolute_limit {
            next.absolute_limit = v;
        }
        if let Some(v) = update.utc_offset_minutes {
            next.utc_offset_minutes = v;
        }
        validate_limits(&next)?;

        *entry.value_mut() = next.clone();
        tracing::info!(
            user = %user,
            transaction_limit = %next.transaction_limit,
            daily_transaction_limit = %next.daily_transaction_limit,
            absolute_limit = %next.absolute_limit,
            "Limits updated"
        );
        Ok(next)
    }
}

fn validate_limits(limits: &UserLimits) -> Result<()> {
    if limits.transaction_limit < Decimal::ZERO {
        return Err(Error::InvalidLimits(format!(
            "transaction limit must not be negative, got {}",
            limits.transaction_limit
        )));
    }
    if limits.daily_transaction_limit < Decimal::ZERO {
        return Err(Error::InvalidLimits(format!(
            "daily transaction limit must not be negative, got {}",
            limits.daily_transaction_limit
        )));
    }
    if limits.absolute_limit > Decimal::ZERO {
        return Err(Error::InvalidLimits(format!(
            "absolute limit must be zero or negative, got {}",
            limits.absolute_limit
        )));
    }
    if !(MIN_UTC_OFFSET_MINUTES..=MAX_UTC_OFFSET_MINUTES).contains(&limits.utc_offset_minutes) {
        return Err(Error::InvalidLimits(format!(
            "utc offset {} minutes is outside the valid range",
            limits.utc_offset_minutes
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provision_and_get() {
        let store = LimitsStore::new();
        let user = UserId::new();
        assert!(matches!(store.get(user), Err(Error::NotConfigured(_))));

        store.provision(user, UserLimits::default()).unwrap();
        let limits = store.get(user).unwrap();
        assert_eq!(limits.transaction_limit, Decimal::from(2_500));
        assert!(store.contains(user));
    }

    #[test]
    fn update_merges_partial_fields() {
        let store = LimitsStore::new();
        let user = UserId::new();
        store.provision(user, UserLimits::default()).unwrap();

        let updated = store
            .update(
                user,
                LimitsUpdate {
                    transaction_limit: Some(Decimal::from(100)),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.transaction_limit, Decimal::from(100));
        assert_eq!(updated.daily_transaction_limit, Decimal::from(5_000));
    }

    #[test]
    fn invalid_values_rejected_and_state_unchanged() {
        let store = LimitsStore::new();
        let user = UserId::new();
        store.provision(user, UserLimits::default()).unwrap();

        let err = store
            .update(
                user,
                LimitsUpdate {
                    daily_transaction_limit: Some(Decimal::from(-1)),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::InvalidLimits(_)));
        assert_eq!(
            store.get(user).unwrap().daily_transaction_limit,
            Decimal::from(5_000)
        );

        let err = store
            .update(
                user,
                LimitsUpdate {
                    absolute_limit: Some(Decimal::ONE),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::InvalidLimits(_)));

        let err = store
            .update(
                user,
                LimitsUpdate {
                    utc_offset_minutes: Some(900),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::InvalidLimits(_)));
    }

    #[test]
    fn update_unknown_user_fails() {
        let store = LimitsStore::new();
        assert!(matches!(
            store.update(UserId::new(), LimitsUpdate::default()),
            Err(Error::NotConfigured(_))
        ));
    }

    #[test]
    fn provision_validates_too() {
        let store = LimitsStore::new();
        let bad = UserLimits {
            transaction_limit: Decimal::from(-5),
            ..Default::default()
        };
        assert!(matches!(
            store.provision(UserId::new(), bad),
            Err(Error::InvalidLimits(_))
        ));
    }
}
