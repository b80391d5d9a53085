//! Referral accounting: crediting referrers and notifying them.

pub mod notify;

pub use notify::{
    DisabledSender, NotificationDispatcher, NotificationQueue, ReferralNotification, SmsSender,
};

use crate::registry::{ReferralCredit, User, UserRegistry};
use tracing::{debug, info, warn};

/// Applies the effects of a signup that carried a referral code.
///
/// Every step is best effort: an unknown code, a storage failure, or a
/// full notification queue is logged and the signup proceeds.
#[derive(Clone)]
pub struct ReferralAccountant {
    registry: UserRegistry,
    notifications: NotificationQueue,
}

impl ReferralAccountant {
    pub fn new(registry: UserRegistry, notifications: NotificationQueue) -> Self {
        Self {
            registry,
            notifications,
        }
    }

    /// Credit the owner of `referral_code` for bringing in `new_user`.
    pub async fn apply(&self, referral_code: &str, new_user: &User) -> Option<ReferralCredit> {
        let referrer = match self.registry.find_by_referral_code(referral_code).await {
            Ok(Some(referrer)) => referrer,
            Ok(None) => {
                debug!(referral_code = %referral_code, "Unknown referral code, ignoring");
                return None;
            }
            Err(e) => {
                warn!(referral_code = %referral_code, error = %e, "Referrer lookup failed");
                return None;
            }
        };

        if referrer.id == new_user.id {
            debug!(user_id = new_user.id, "Ignoring self-referral");
            return None;
        }

        let credit = match self.registry.credit_referral(referral_code, new_user.id).await {
            Ok(Some(credit)) => credit,
            Ok(None) => {
                debug!(referral_code = %referral_code, "Referrer vanished before credit");
                return None;
            }
            Err(e) => {
                warn!(referral_code = %referral_code, error = %e, "Failed to credit referral");
                return None;
            }
        };

        info!(
            referrer = %credit.referrer_phone,
            new_user_id = new_user.id,
            entries = credit.entries,
            "Referral credited"
        );

        self.notifications.enqueue(ReferralNotification::credited(
            credit.referrer_phone.clone(),
            credit.entries,
        ));

        Some(credit)
    }
}
