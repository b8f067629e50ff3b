//! Notification preferences

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};

use super::supabase::SupabaseClient;
use super::{PreferenceStore, StoreError};

/// Preference type that toggles all notifications at once
pub const GLOBAL_PREFERENCE_TYPE: &str = "notifications";

/// Resolved preferences for one user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub notifications_enabled: bool,
    pub disabled_types: Vec<String>,
}

impl UserPreferences {
    /// Whether a notification of `kind` may be delivered
    pub fn allows(&self, kind: &str) -> bool {
        self.notifications_enabled && !self.disabled_types.iter().any(|t| t == kind)
    }

    /// Collapse stored rows; `None` when the user has no rows at all.
    ///
    /// Only an explicit `notifications` row with `enabled = false` turns
    /// everything off; a missing global row counts as enabled.
    pub fn from_rows(rows: &[PreferenceRow]) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }

        let notifications_enabled = !rows
            .iter()
            .any(|r| r.kind == GLOBAL_PREFERENCE_TYPE && !r.enabled);

        let disabled_types = rows
            .iter()
            .filter(|r| !r.enabled && r.kind != GLOBAL_PREFERENCE_TYPE)
            .map(|r| r.kind.clone())
            .collect();

        Some(Self {
            notifications_enabled,
            disabled_types,
        })
    }
}

/// Row of the `user_preferences` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceRow {
    #[serde(rename = "type")]
    pub kind: String,
    pub enabled: bool,
}

/// Preferences backed by the `user_preferences` table
#[derive(Clone)]
pub struct SupabasePreferenceStore {
    client: SupabaseClient,
}

impl SupabasePreferenceStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

impl PreferenceStore for SupabasePreferenceStore {
    fn get_by_user_id(
        &self,
        user_id: i64,
    ) -> BoxFuture<'_, Result<Option<UserPreferences>, StoreError>> {
        async move {
            let query = format!("user_id=eq.{}&select=type,enabled", user_id);
            let rows: Vec<PreferenceRow> = self.client.get("user_preferences", &query).await?;
            Ok::<_, StoreError>(UserPreferences::from_rows(&rows))
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(kind: &str, enabled: bool) -> PreferenceRow {
        PreferenceRow {
            kind: kind.into(),
            enabled,
        }
    }

    #[test]
    fn no_rows_means_no_preferences() {
        assert_eq!(UserPreferences::from_rows(&[]), None);
    }

    #[test]
    fn global_disable_blocks_everything() {
        let prefs = UserPreferences::from_rows(&[row("notifications", false)]).unwrap();
        assert!(!prefs.notifications_enabled);
        assert!(!prefs.allows("LEVEL_UP"));
    }

    #[test]
    fn per_type_disable_only_blocks_that_type() {
        let prefs = UserPreferences::from_rows(&[row("LEVEL_UP", false), row("GAME_EVENT", true)]).unwrap();
        assert!(prefs.notifications_enabled);
        assert!(!prefs.allows("LEVEL_UP"));
        assert!(prefs.allows("GAME_EVENT"));
        assert!(prefs.allows("ITEM_ACQUIRED"));
    }

    #[test]
    fn rows_without_a_global_row_stay_enabled() {
        let prefs = UserPreferences::from_rows(&[row("FRIEND_REQUEST", true)]).unwrap();
        assert!(prefs.notifications_enabled);
        assert!(prefs.disabled_types.is_empty());
        assert!(prefs.allows("GAME_OVER"));

        let prefs = UserPreferences::from_rows(&[row("notifications", true), row("GAME_OVER", false)]).unwrap();
        assert!(prefs.notifications_enabled);
        assert_eq!(prefs.disabled_types, vec!["GAME_OVER".to_string()]);
    }
}
