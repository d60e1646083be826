//! Sync Service
//!
//! Confirmation flow of the sync screen:
//!
//! ```text
//! Idle --submit--> AwaitingConfirmation --confirm--> Running --> Idle
//!                          |
//!                          +--cancel--> Idle
//! ```
//!
//! The service keeps only the flow phase. Sync status and notifications live
//! in their stores on [`AppState`].

use crate::api::types::SyncResponse;
use crate::error::{AppError, Result};
use crate::services::format::relative_time_key;
use crate::state::AppState;
use crate::stores::NotificationKind;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

pub const SYNC_SUCCESS_MESSAGE: &str =
    "Synchronization completed successfully. The data is ready to be viewed.";
pub const INCOMPLETE_SYNC_MESSAGE: &str =
    "The previous synchronization did not complete. Please try again.";
pub const INVALID_LIMIT_MESSAGE: &str = "Please enter a valid number greater than 0";

/// How a sync limit that is blank, non-numeric or below one is handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncLimitPolicy {
    /// Replace it with 1 and continue to confirmation
    #[default]
    Clamp,
    /// Reject it and stay idle until the form is corrected
    Strict,
}

/// Raw limit as entered in the sync form
#[derive(Debug, Clone, PartialEq)]
pub enum SyncLimitInput {
    Number(i64),
    Text(String),
}

impl From<i64> for SyncLimitInput {
    fn from(n: i64) -> Self {
        SyncLimitInput::Number(n)
    }
}

impl From<u32> for SyncLimitInput {
    fn from(n: u32) -> Self {
        SyncLimitInput::Number(i64::from(n))
    }
}

impl From<&str> for SyncLimitInput {
    fn from(s: &str) -> Self {
        SyncLimitInput::Text(s.to_string())
    }
}

impl From<String> for SyncLimitInput {
    fn from(s: String) -> Self {
        SyncLimitInput::Text(s)
    }
}

impl SyncLimitInput {
    /// Integer value, if the input holds one
    ///
    /// Text yields its leading integer after optional whitespace and sign,
    /// ignoring whatever follows: `"12abc"` is 12, `"2.9"` is 2, `"1e3"` is 1.
    pub fn parse(&self) -> Option<i64> {
        match self {
            SyncLimitInput::Number(n) => Some(*n),
            SyncLimitInput::Text(raw) => leading_integer(raw),
        }
    }
}

fn leading_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }

    let magnitude = rest[..digits].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

/// Returns the flow to `Idle` when a confirmation ends, including when its
/// future is dropped mid-request
struct PhaseReset<'a>(&'a mut SyncPhase);

impl Drop for PhaseReset<'_> {
    fn drop(&mut self) {
        *self.0 = SyncPhase::Idle;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SyncPhase {
    Idle,
    AwaitingConfirmation { limit: u32 },
    Running { limit: u32 },
}

/// Sync status as the sync screen shows it
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SyncStatusView {
    pub in_progress: bool,
    pub data_updated_unacknowledged: bool,
    pub last_success_time: Option<DateTime<Utc>>,
    /// Relative-time translation key for `last_success_time`
    pub last_sync_label: Option<String>,
}

pub struct SyncService {
    policy: SyncLimitPolicy,
    phase: SyncPhase,
}

impl Default for SyncService {
    fn default() -> Self {
        Self::new(SyncLimitPolicy::default())
    }
}

impl SyncService {
    pub fn new(policy: SyncLimitPolicy) -> Self {
        Self {
            policy,
            phase: SyncPhase::Idle,
        }
    }

    pub fn policy(&self) -> SyncLimitPolicy {
        self.policy
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, SyncPhase::Running { .. })
    }

    pub fn show_confirmation(&self) -> bool {
        matches!(self.phase, SyncPhase::AwaitingConfirmation { .. })
    }

    /// Limit waiting for confirmation, if any
    pub fn pending_limit(&self) -> Option<u32> {
        match self.phase {
            SyncPhase::AwaitingConfirmation { limit } => Some(limit),
            _ => None,
        }
    }

    /// Screen startup: clear a sync left running by an earlier screen
    ///
    /// Returns whether anything had to be recovered; if so the user is warned.
    pub fn mount(&mut self, state: &AppState) -> bool {
        self.phase = SyncPhase::Idle;

        let recovered = state.sync.recover_from_incomplete_sync();
        if recovered {
            state
                .notifications
                .add_notification(INCOMPLETE_SYNC_MESSAGE, NotificationKind::Warning);
        }
        recovered
    }

    /// Validate the form limit and ask for confirmation
    ///
    /// Under [`SyncLimitPolicy::Strict`] an invalid limit is returned as a
    /// validation error and the phase does not change. Nothing in the stores
    /// is touched either way.
    pub fn handle_sync_submit(&mut self, input: impl Into<SyncLimitInput>) -> Result<u32> {
        if self.is_loading() {
            return Err(AppError::Validation(
                "A synchronization is already running".to_string(),
            ));
        }

        let input = input.into();
        let parsed = input.parse().filter(|n| *n >= 1);

        let limit = match (parsed, self.policy) {
            (Some(n), _) => u32::try_from(n).unwrap_or(u32::MAX),
            (None, SyncLimitPolicy::Clamp) => 1,
            (None, SyncLimitPolicy::Strict) => {
                warn!(?input, "Rejected sync limit");
                return Err(AppError::Validation(INVALID_LIMIT_MESSAGE.to_string()));
            }
        };

        self.phase = SyncPhase::AwaitingConfirmation { limit };
        Ok(limit)
    }

    /// Dismiss the confirmation prompt
    pub fn cancel(&mut self) {
        if self.show_confirmation() {
            self.phase = SyncPhase::Idle;
        }
    }

    /// Run the confirmed sync
    ///
    /// Failures are reported through the notification log and swallowed.
    /// Returns the backend response on success, `None` otherwise (including
    /// when there was nothing to confirm).
    pub async fn confirm(&mut self, state: &AppState) -> Option<SyncResponse> {
        let SyncPhase::AwaitingConfirmation { limit } = self.phase else {
            warn!(phase = ?self.phase, "Nothing to confirm");
            return None;
        };

        self.phase = SyncPhase::Running { limit };
        let phase = PhaseReset(&mut self.phase);
        state.sync.start_sync();
        info!(limit, "Requesting backend sync");

        let outcome = state.api.sync_stocks(limit).await;
        drop(phase);

        match outcome {
            Ok(response) => {
                state.sync.complete_sync(true);
                state
                    .notifications
                    .add_notification(SYNC_SUCCESS_MESSAGE, NotificationKind::Success);
                Some(response)
            }
            Err(e) => {
                error!(code = e.code(), "Error during synchronization: {}", e);
                state.sync.complete_sync(false);
                state.notifications.add_notification(
                    format!("Error during synchronization: {}. Please try again.", e),
                    NotificationKind::Error,
                );
                None
            }
        }
    }

    pub fn status(state: &AppState, now: DateTime<Utc>) -> SyncStatusView {
        let status = state.sync.status();

        SyncStatusView {
            in_progress: status.in_progress,
            data_updated_unacknowledged: status.data_updated_unacknowledged,
            last_success_time: status.last_success_time,
            last_sync_label: status
                .last_success_time
                .map(|then| relative_time_key(then, now)),
        }
    }
}
