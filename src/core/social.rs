//! Social graph - Friend requests, friend lists and profile visibility.
//!
//! Requests live in their own table and keep `accepted`/`ignored` once
//! answered. A confirmed friendship is stored as two rows, one per direction,
//! written together with the request status in one database transaction.

use crate::{
    auth::{self, Session},
    entities::{FriendRequest, Friendship, User, friend_request, friendship, user},
    errors::{Error, Result},
    models::FriendRequestStatus,
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use std::collections::HashMap;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// What happened to a friend request attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FriendRequestOutcome {
    /// A pending request was stored
    Sent(friend_request::Model),
    /// Sender and target are the same account
    CannotBefriendSelf,
    /// The two are friends already
    AlreadyFriends,
    /// The sender has a pending request to the target
    AlreadyRequested,
}

/// Request state between a viewer and a profile they cannot fully see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    /// No pending request either way
    None,
    /// The viewer asked the target
    PendingOutgoing,
    /// The target asked the viewer
    PendingIncoming,
}

/// A profile as a given viewer may see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileView {
    /// Owner or confirmed friend
    Full(user::Model),
    /// Anyone else: display fields and the request state only
    Locked {
        /// Profile id
        id: String,
        /// Display name
        name: String,
        /// Avatar reference
        avatar_id: String,
        /// Pending request between viewer and target
        request: RequestState,
    },
}

async fn are_friends<C>(conn: &C, user_id: &str, friend_id: &str) -> Result<bool>
where
    C: ConnectionTrait,
{
    Ok(Friendship::find_by_id((user_id.to_string(), friend_id.to_string()))
        .one(conn)
        .await?
        .is_some())
}

async fn pending_between(
    db: &DatabaseConnection,
    from_user_id: &str,
    to_user_id: &str,
) -> Result<Option<friend_request::Model>> {
    FriendRequest::find()
        .filter(friend_request::Column::FromUserId.eq(from_user_id))
        .filter(friend_request::Column::ToUserId.eq(to_user_id))
        .filter(friend_request::Column::Status.eq(FriendRequestStatus::Pending.as_str()))
        .one(db)
        .await
        .map_err(Into::into)
}

async fn link<C>(conn: &C, user_id: &str, friend_id: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    if are_friends(conn, user_id, friend_id).await? {
        return Ok(());
    }
    friendship::ActiveModel {
        user_id: Set(user_id.to_string()),
        friend_id: Set(friend_id.to_string()),
        created_at: Set(Utc::now()),
    }
    .insert(conn)
    .await?;
    Ok(())
}

/// Sends a friend request from the session user.
///
/// # Errors
/// `Error::UserNotFound` when the target does not exist.
#[instrument(skip(db, sender), fields(user_id = sender.user_id()))]
pub async fn send_friend_request(
    db: &DatabaseConnection,
    sender: &Session,
    to_user_id: &str,
) -> Result<FriendRequestOutcome> {
    if sender.user_id() == to_user_id {
        return Ok(FriendRequestOutcome::CannotBefriendSelf);
    }
    if User::find_by_id(to_user_id).one(db).await?.is_none() {
        return Err(Error::UserNotFound {
            id: to_user_id.to_string(),
        });
    }
    let from = auth::current_user(db, sender).await?;

    if are_friends(db, to_user_id, &from.id).await? {
        debug!("Already friends with {}", to_user_id);
        return Ok(FriendRequestOutcome::AlreadyFriends);
    }
    if pending_between(db, &from.id, to_user_id).await?.is_some() {
        debug!("Request to {} already pending", to_user_id);
        return Ok(FriendRequestOutcome::AlreadyRequested);
    }

    let request = friend_request::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        from_user_id: Set(from.id.clone()),
        from_username: Set(from.username.clone()),
        from_name: Set(from.name.clone()),
        from_avatar_id: Set(from.avatar_id.clone()),
        to_user_id: Set(to_user_id.to_string()),
        status: Set(FriendRequestStatus::Pending.as_str().to_string()),
        created_at: Set(Utc::now()),
        responded_at: Set(None),
    }
    .insert(db)
    .await?;

    info!("{} sent a friend request to {}", from.username, to_user_id);
    Ok(FriendRequestOutcome::Sent(request))
}

/// Accepts or ignores a pending request addressed to the session user.
///
/// Returns the resolved request, or None when no pending request with that id
/// is addressed to the owner.
#[instrument(skip(db, owner), fields(user_id = owner.user_id()))]
pub async fn respond_to_friend_request(
    db: &DatabaseConnection,
    owner: &Session,
    request_id: &str,
    accept: bool,
) -> Result<Option<friend_request::Model>> {
    let txn = db.begin().await?;

    let Some(request) = FriendRequest::find_by_id(request_id).one(&txn).await? else {
        return Ok(None);
    };
    if request.to_user_id != owner.user_id()
        || request.status != FriendRequestStatus::Pending.as_str()
    {
        debug!("Request {} is not pending for this account", request.id);
        return Ok(None);
    }

    if accept {
        link(&txn, &request.to_user_id, &request.from_user_id).await?;
        link(&txn, &request.from_user_id, &request.to_user_id).await?;
    }

    let status = if accept {
        FriendRequestStatus::Accepted
    } else {
        FriendRequestStatus::Ignored
    };
    let mut active: friend_request::ActiveModel = request.into();
    active.status = Set(status.as_str().to_string());
    active.responded_at = Set(Some(Utc::now()));
    let resolved = active.update(&txn).await?;

    txn.commit().await?;

    info!(
        "Friend request from {} {}",
        resolved.from_username, resolved.status
    );
    Ok(Some(resolved))
}

/// Requests waiting for `user_id` to answer, oldest first.
pub async fn pending_friend_requests(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Vec<friend_request::Model>> {
    FriendRequest::find()
        .filter(friend_request::Column::ToUserId.eq(user_id))
        .filter(friend_request::Column::Status.eq(FriendRequestStatus::Pending.as_str()))
        .order_by_asc(friend_request::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Ids of everyone `user_id` is friends with.
pub async fn friend_ids(db: &DatabaseConnection, user_id: &str) -> Result<Vec<String>> {
    Ok(Friendship::find()
        .filter(friendship::Column::UserId.eq(user_id))
        .order_by_asc(friendship::Column::CreatedAt)
        .all(db)
        .await?
        .into_iter()
        .map(|f| f.friend_id)
        .collect())
}

/// Profiles for `ids` in the given order. Ids without a profile are skipped.
pub async fn get_friends_list(db: &DatabaseConnection, ids: &[String]) -> Result<Vec<user::Model>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut found: HashMap<String, user::Model> = User::find()
        .filter(user::Column::Id.is_in(ids.iter().map(String::as_str)))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id.clone(), u))
        .collect();

    Ok(ids.iter().filter_map(|id| found.remove(id)).collect())
}

/// Looks up another account by exact username.
pub async fn search_user_by_username(
    db: &DatabaseConnection,
    username: &str,
) -> Result<Option<user::Model>> {
    let username = username.trim();
    if username.is_empty() {
        return Ok(None);
    }
    User::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await
        .map_err(Into::into)
}

/// What the session user may see of `target_id`. None when it does not exist.
pub async fn view_profile(
    db: &DatabaseConnection,
    viewer: &Session,
    target_id: &str,
) -> Result<Option<ProfileView>> {
    let Some(target) = User::find_by_id(target_id).one(db).await? else {
        return Ok(None);
    };
    if target.id == viewer.user_id() || are_friends(db, viewer.user_id(), &target.id).await? {
        return Ok(Some(ProfileView::Full(target)));
    }

    let request = if pending_between(db, viewer.user_id(), &target.id).await?.is_some() {
        RequestState::PendingOutgoing
    } else if pending_between(db, &target.id, viewer.user_id()).await?.is_some() {
        RequestState::PendingIncoming
    } else {
        RequestState::None
    };

    Ok(Some(ProfileView::Locked {
        id: target.id,
        name: target.name,
        avatar_id: target.avatar_id,
        request,
    }))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    fn sent(outcome: FriendRequestOutcome) -> friend_request::Model {
        match outcome {
            FriendRequestOutcome::Sent(request) => request,
            other => panic!("expected a sent request, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_friend_request_accept_scenario() -> Result<()> {
        let (db, _, guardian, alice, alice_session) = setup_household().await?;
        let (bob, bob_session) = create_test_child(&db, &guardian, "bob").await?;

        let request = sent(send_friend_request(&db, &alice_session, &bob.id).await?);
        assert_eq!(request.from_username, alice.username);
        assert_eq!(request.status, "pending");
        assert_eq!(pending_friend_requests(&db, &bob.id).await?.len(), 1);

        let resolved = respond_to_friend_request(&db, &bob_session, &request.id, true)
            .await?
            .unwrap();
        assert_eq!(resolved.status, "accepted");
        assert!(resolved.responded_at.is_some());

        assert_eq!(friend_ids(&db, &bob.id).await?, vec![alice.id.clone()]);
        assert_eq!(friend_ids(&db, &alice.id).await?, vec![bob.id.clone()]);
        assert!(pending_friend_requests(&db, &bob.id).await?.is_empty());

        // Terminal status is kept
        let stored = FriendRequest::find_by_id(request.id.as_str()).one(&db).await?.unwrap();
        assert_eq!(stored.status, "accepted");

        Ok(())
    }

    #[tokio::test]
    async fn test_send_friend_request_preconditions() -> Result<()> {
        let (db, _, guardian, alice, alice_session) = setup_household().await?;
        let (bob, bob_session) = create_test_child(&db, &guardian, "bob").await?;

        let outcome = send_friend_request(&db, &alice_session, &alice.id).await?;
        assert_eq!(outcome, FriendRequestOutcome::CannotBefriendSelf);

        let result = send_friend_request(&db, &alice_session, "ghost").await;
        assert!(matches!(result, Err(Error::UserNotFound { id: _ })));

        let request = sent(send_friend_request(&db, &alice_session, &bob.id).await?);
        let outcome = send_friend_request(&db, &alice_session, &bob.id).await?;
        assert_eq!(outcome, FriendRequestOutcome::AlreadyRequested);

        respond_to_friend_request(&db, &bob_session, &request.id, true).await?.unwrap();
        let outcome = send_friend_request(&db, &alice_session, &bob.id).await?;
        assert_eq!(outcome, FriendRequestOutcome::AlreadyFriends);
        let outcome = send_friend_request(&db, &bob_session, &alice.id).await?;
        assert_eq!(outcome, FriendRequestOutcome::AlreadyFriends);

        Ok(())
    }

    #[tokio::test]
    async fn test_ignore_and_foreign_requests() -> Result<()> {
        let (db, _, guardian, _, alice_session) = setup_household().await?;
        let (bob, bob_session) = create_test_child(&db, &guardian, "bob").await?;
        let (_, carol_session) = create_test_child(&db, &guardian, "carol").await?;

        let request = sent(send_friend_request(&db, &alice_session, &bob.id).await?);

        // Only the recipient may answer
        assert!(
            respond_to_friend_request(&db, &carol_session, &request.id, true)
                .await?
                .is_none()
        );

        let resolved = respond_to_friend_request(&db, &bob_session, &request.id, false)
            .await?
            .unwrap();
        assert_eq!(resolved.status, "ignored");
        assert!(friend_ids(&db, &bob.id).await?.is_empty());

        // Already resolved
        assert!(
            respond_to_friend_request(&db, &bob_session, &request.id, true)
                .await?
                .is_none()
        );
        assert!(
            respond_to_friend_request(&db, &bob_session, "missing", true)
                .await?
                .is_none()
        );

        // Ignoring does not block a fresh request
        let outcome = send_friend_request(&db, &alice_session, &bob.id).await?;
        assert!(matches!(outcome, FriendRequestOutcome::Sent(_)));

        Ok(())
    }

    #[tokio::test]
    async fn test_crossed_requests_both_accepted() -> Result<()> {
        let (db, _, guardian, alice, alice_session) = setup_household().await?;
        let (bob, bob_session) = create_test_child(&db, &guardian, "bob").await?;

        let from_alice = sent(send_friend_request(&db, &alice_session, &bob.id).await?);
        let from_bob = sent(send_friend_request(&db, &bob_session, &alice.id).await?);

        respond_to_friend_request(&db, &bob_session, &from_alice.id, true).await?.unwrap();
        respond_to_friend_request(&db, &alice_session, &from_bob.id, true).await?.unwrap();

        assert_eq!(friend_ids(&db, &alice.id).await?.len(), 1);
        assert_eq!(friend_ids(&db, &bob.id).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_friends_list_skips_missing() -> Result<()> {
        let (db, guardian_model, _, child, _) = setup_household().await?;

        let ids = vec![child.id.clone(), "ghost".to_string(), guardian_model.id.clone()];
        let friends = get_friends_list(&db, &ids).await?;

        assert_eq!(friends.len(), 2);
        assert_eq!(friends[0].id, child.id);
        assert_eq!(friends[1].id, guardian_model.id);
        assert!(get_friends_list(&db, &[]).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_search_user_by_username() -> Result<()> {
        let (db, _, _, child, _) = setup_household().await?;

        let found = search_user_by_username(&db, &format!(" {} ", child.username)).await?;
        assert_eq!(found.unwrap().id, child.id);
        assert!(search_user_by_username(&db, "nobody").await?.is_none());
        assert!(search_user_by_username(&db, "").await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_view_profile_privacy() -> Result<()> {
        let (db, _, guardian, alice, alice_session) = setup_household().await?;
        let (bob, bob_session) = create_test_child(&db, &guardian, "bob").await?;

        let own = view_profile(&db, &alice_session, &alice.id).await?.unwrap();
        assert!(matches!(own, ProfileView::Full(_)));

        let stranger = view_profile(&db, &alice_session, &bob.id).await?.unwrap();
        assert!(matches!(
            stranger,
            ProfileView::Locked {
                request: RequestState::None,
                ..
            }
        ));

        let request = sent(send_friend_request(&db, &alice_session, &bob.id).await?);
        let outgoing = view_profile(&db, &alice_session, &bob.id).await?.unwrap();
        assert!(matches!(
            outgoing,
            ProfileView::Locked {
                request: RequestState::PendingOutgoing,
                ..
            }
        ));
        let incoming = view_profile(&db, &bob_session, &alice.id).await?.unwrap();
        assert!(matches!(
            incoming,
            ProfileView::Locked {
                request: RequestState::PendingIncoming,
                ..
            }
        ));

        respond_to_friend_request(&db, &bob_session, &request.id, true).await?.unwrap();
        let friend = view_profile(&db, &alice_session, &bob.id).await?.unwrap();
        assert_eq!(friend, ProfileView::Full(reload_user(&db, &bob.id).await?));

        assert!(view_profile(&db, &alice_session, "ghost").await?.is_none());

        Ok(())
    }
}
