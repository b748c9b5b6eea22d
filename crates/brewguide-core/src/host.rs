//! What the embedding shell can tell us and do for us.
//!
//! A messenger web view supplies the signed-in user and can vibrate the
//! device; a terminal can do neither. Everything here is best effort:
//! hints are fire-and-forget and a missing profile is not an error.

use serde::{Deserialize, Serialize};

/// Read-only profile reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
}

impl UserProfile {
    /// First and last name joined by a space.
    pub fn display_name(&self) -> String {
        match self.last_name.as_deref().filter(|s| !s.is_empty()) {
            Some(last) => format!("{} {last}", self.first_name),
            None => self.first_name.clone(),
        }
    }

    /// Uppercased first letter of the first name, `U` when empty.
    pub fn initial(&self) -> String {
        self.first_name
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_else(|| "U".to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HapticStyle {
    Light,
    Medium,
    Heavy,
    Rigid,
    Soft,
}

pub trait HostCapabilities: Send {
    fn user(&self) -> Option<UserProfile>;

    /// Locale tag the host reports for the user, if any.
    fn locale(&self) -> Option<String> {
        self.user().and_then(|u| u.language_code)
    }

    /// Ask the host to give the app its full viewport.
    fn expand_view(&self) {}

    fn haptic_pulse(&self, _style: HapticStyle) {}

    fn is_test_mode(&self) -> bool {
        false
    }
}

/// Stand-in used when no host is attached. Reports a fixed test user.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHost;

impl NoHost {
    pub fn test_user() -> UserProfile {
        UserProfile {
            id: 123_456_789,
            first_name: "Тестовый".into(),
            last_name: Some("Пользователь".into()),
            username: Some("test_user".into()),
            language_code: Some("ru".into()),
        }
    }
}

impl HostCapabilities for NoHost {
    fn user(&self) -> Option<UserProfile> {
        Some(Self::test_user())
    }

    fn haptic_pulse(&self, style: HapticStyle) {
        tracing::trace!(?style, "haptic hint ignored");
    }

    fn is_test_mode(&self) -> bool {
        true
    }
}
