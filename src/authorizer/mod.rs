//! Private-channel admission decisions.

use std::sync::Arc;

use crate::auth::Principal;
use crate::channel::Channel;
use crate::directory::GroupDirectory;
use crate::metrics::AuthMetrics;

/// Decides whether a principal may subscribe to a private channel.
///
/// Membership or ownership is the only admission criterion. A failed lookup
/// (unknown group) is a deny, never an error.
pub struct ChannelAuthorizer {
    groups: Arc<dyn GroupDirectory>,
}

impl ChannelAuthorizer {
    pub fn new(groups: Arc<dyn GroupDirectory>) -> Self {
        Self { groups }
    }

    /// Authorize `principal` to join `channel`. No side effects.
    pub async fn authorize(&self, principal: Principal, channel: &Channel) -> bool {
        let granted = match channel {
            Channel::Group(group_id) => self.groups.is_participant(*group_id, principal.id).await,
            Channel::Notification(owner_id) | Channel::User(owner_id) => principal.id == *owner_id,
        };

        if granted {
            AuthMetrics::record_allowed();
        } else {
            AuthMetrics::record_denied();
        }

        tracing::debug!(
            user_id = principal.id,
            channel = %channel,
            granted = granted,
            "Channel join decision"
        );

        granted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{GroupRecord, MemoryGroupDirectory};

    fn seeded_groups() -> Arc<MemoryGroupDirectory> {
        let groups = MemoryGroupDirectory::new();
        groups.insert(GroupRecord {
            id: 3,
            name: "lisbon-trip".to_string(),
            hash: "abc".to_string(),
        });
        groups.add_participant(3, 5);
        Arc::new(groups)
    }

    #[tokio::test]
    async fn test_group_channel_admits_participants_only() {
        let groups = seeded_groups();
        let authorizer = ChannelAuthorizer::new(groups.clone());

        assert!(authorizer.authorize(Principal::new(5), &Channel::Group(3)).await);
        assert!(!authorizer.authorize(Principal::new(9), &Channel::Group(3)).await);
    }

    #[tokio::test]
    async fn test_removing_participant_flips_decision() {
        let groups = seeded_groups();
        let authorizer = ChannelAuthorizer::new(groups.clone());

        assert!(authorizer.authorize(Principal::new(5), &Channel::Group(3)).await);
        groups.remove_participant(3, 5);
        assert!(!authorizer.authorize(Principal::new(5), &Channel::Group(3)).await);
    }

    #[tokio::test]
    async fn test_unknown_group_denies() {
        let authorizer = ChannelAuthorizer::new(seeded_groups());
        assert!(!authorizer.authorize(Principal::new(5), &Channel::Group(404)).await);
    }

    #[tokio::test]
    async fn test_notification_channel_admits_owner_only() {
        let authorizer = ChannelAuthorizer::new(seeded_groups());

        assert!(
            authorizer
                .authorize(Principal::new(7), &Channel::Notification(7))
                .await
        );
        assert!(
            !authorizer
                .authorize(Principal::new(8), &Channel::Notification(7))
                .await
        );
    }

    #[tokio::test]
    async fn test_user_channel_admits_owner_only() {
        let authorizer = ChannelAuthorizer::new(seeded_groups());

        assert!(authorizer.authorize(Principal::new(7), &Channel::User(7)).await);
        assert!(!authorizer.authorize(Principal::new(8), &Channel::User(7)).await);
    }
}
