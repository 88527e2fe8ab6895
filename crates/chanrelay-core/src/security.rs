use crate::{domain::UserId, registry::SubscriptionRegistry};

// ============== Authorization ==============

/// Configured admins and relay recipients may issue commands.
///
/// Recipients double as the allow-list so that existing user lists keep
/// working; admins come from configuration and are never relayed to.
pub fn is_authorized(
    user_id: Option<UserId>,
    admins: &[UserId],
    registry: &SubscriptionRegistry,
) -> bool {
    let Some(user_id) = user_id else {
        return false;
    };
    admins.contains(&user_id) || registry.is_recipient(user_id)
}
