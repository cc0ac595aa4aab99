//! Remote directory service
//!
//! Groups, memberships, weekly auditor rotations and chat, kept as
//! documents in the remote store. Constructed explicitly with its auth
//! provider and store; it owns the signed-in session.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::auth::AuthProvider;
use super::saga::Saga;
use super::store::{
    get_document, put_document, query_documents, Collection, DocumentRef, DocumentStore,
};
use crate::config::DirectoryConfig;
use crate::models::{
    AppUser, ChatMessage, Group, GroupMember, MemberRole, MessageType, WeeklyAuditor, WEEK_DAYS,
};
use crate::utils::errors::{AuditError, Result};
use crate::utils::helpers::{
    generate_id, generate_invite_code, is_valid_invite_code, normalize_whitespace,
};
use crate::utils::logging::log_group_event;

pub struct DirectoryService {
    auth: Arc<dyn AuthProvider>,
    store: Arc<dyn DocumentStore>,
    config: DirectoryConfig,
    session: RwLock<Option<AppUser>>,
}

impl DirectoryService {
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        store: Arc<dyn DocumentStore>,
        config: DirectoryConfig,
    ) -> Self {
        Self {
            auth,
            store,
            config,
            session: RwLock::new(None),
        }
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    // --- session -------------------------------------------------------

    /// Sign in with a federated credential.
    ///
    /// The profile document write afterwards is best effort: if it fails the
    /// sign-in still succeeds.
    pub async fn sign_in_with_federated_account(&self, token: &str) -> Result<AppUser> {
        let verified = self.auth.verify_federated_token(token).await?;

        let user = match get_document::<AppUser>(self.store(), &verified.uid).await {
            Ok(Some(stored)) => {
                debug!(uid = %stored.uid, "Existing profile found");
                stored
            }
            Ok(None) => {
                if let Err(e) = put_document(self.store(), &verified).await {
                    warn!(
                        uid = %verified.uid,
                        error = %e,
                        "Failed to write user profile, continuing"
                    );
                }
                verified
            }
            Err(e) => {
                warn!(uid = %verified.uid, error = %e, "Failed to read user profile, continuing");
                verified
            }
        };

        info!(uid = %user.uid, "Signed in");
        *self.session.write().await = Some(user.clone());
        Ok(user)
    }

    pub async fn sign_out(&self) {
        if let Some(user) = self.session.write().await.take() {
            info!(uid = %user.uid, "Signed out");
        }
    }

    pub async fn current_user(&self) -> Option<AppUser> {
        self.session.read().await.clone()
    }

    async fn require_user(&self) -> Result<AppUser> {
        self.current_user().await.ok_or(AuditError::NotSignedIn)
    }

    pub async fn get_user_profile(&self, uid: &str) -> Result<Option<AppUser>> {
        get_document(self.store(), uid).await
    }

    // --- groups --------------------------------------------------------

    /// Create a group owned by the signed-in user.
    ///
    /// Writes the group and then the owner membership; if the membership
    /// write fails the group document is removed again.
    pub async fn create_group(&self, name: &str, description: &str) -> Result<Group> {
        let owner = self.require_user().await?;
        let name = normalize_whitespace(name);
        if name.is_empty() {
            return Err(AuditError::Validation("Group name is required".to_string()));
        }

        let invite_code = self.allocate_invite_code().await?;
        let now = Utc::now();
        let group = Group {
            id: generate_id(),
            name,
            description: description.trim().to_string(),
            invite_code,
            owner_id: owner.uid.clone(),
            owner_name: owner.display_name.clone(),
            created_at: now,
            member_count: 1,
        };
        let membership = GroupMember {
            id: generate_id(),
            group_id: group.id.clone(),
            user_id: owner.uid.clone(),
            user_name: owner.display_name.clone(),
            user_email: owner.email.clone(),
            role: MemberRole::Owner,
            joined_at: now,
        };

        let mut saga = Saga::new(self.store(), "create_group");
        saga.create(Collection::Groups, &group.id, serde_json::to_value(&group)?)
            .await?;
        if let Err(e) = saga
            .create(
                Collection::GroupMembers,
                &membership.id,
                serde_json::to_value(&membership)?,
            )
            .await
        {
            error!(group_id = %group.id, error = %e, "Owner membership write failed");
            saga.compensate().await;
            return Err(e);
        }
        saga.commit();

        log_group_event(&group.id, "created", Some(&owner.uid), Some(&group.name));
        Ok(group)
    }

    /// Pick a code no existing group uses, retrying a bounded number of times
    async fn allocate_invite_code(&self) -> Result<String> {
        for attempt in 1..=self.config.invite_code_attempts {
            let code = generate_invite_code();
            let clashes = self
                .store
                .query_eq(Collection::Groups, "inviteCode", &Value::String(code.clone()))
                .await?;
            if clashes.is_empty() {
                return Ok(code);
            }
            warn!(attempt = attempt, "Invite code collision, retrying");
        }

        Err(AuditError::ServiceUnavailable(
            "Could not allocate a unique invite code".to_string(),
        ))
    }

    pub async fn get_group(&self, group_id: &str) -> Result<Group> {
        get_document::<Group>(self.store(), group_id)
            .await?
            .ok_or_else(|| AuditError::GroupNotFound {
                group_id: group_id.to_string(),
            })
    }

    /// Join the group owning `invite_code` as a MEMBER.
    ///
    /// The membership check and the write are separate calls, so two
    /// concurrent joins by one user can both succeed.
    pub async fn join_group(&self, invite_code: &str) -> Result<Group> {
        let user = self.require_user().await?;
        let code = invite_code.trim();
        if !is_valid_invite_code(code) {
            return Err(AuditError::InvalidInviteCode {
                code: code.to_string(),
            });
        }

        let mut group = query_documents::<Group>(self.store(), "inviteCode", code)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AuditError::InvalidInviteCode {
                code: code.to_string(),
            })?;

        if self.find_membership(&group.id, &user.uid).await?.is_some() {
            return Err(AuditError::AlreadyMember);
        }

        let membership = GroupMember {
            id: generate_id(),
            group_id: group.id.clone(),
            user_id: user.uid.clone(),
            user_name: user.display_name.clone(),
            user_email: user.email.clone(),
            role: MemberRole::Member,
            joined_at: Utc::now(),
        };
        put_document(self.store(), &membership).await?;

        group.member_count = self
            .store
            .increment_clamped(Collection::Groups, &group.id, "memberCount", 1, 0)
            .await?;

        let notice = format!("{} joined the group", user.display_name);
        if let Err(e) = self.post_system_message(&group.id, &notice).await {
            warn!(group_id = %group.id, error = %e, "Failed to post join notice");
        }

        log_group_event(&group.id, "joined", Some(&user.uid), None);
        Ok(group)
    }

    /// Leave a group. The owner has to delete the group instead.
    pub async fn leave_group(&self, group_id: &str) -> Result<i64> {
        let user = self.require_user().await?;
        let membership = self
            .find_membership(group_id, &user.uid)
            .await?
            .ok_or_else(|| AuditError::GroupNotFound {
                group_id: group_id.to_string(),
            })?;

        match membership.role {
            MemberRole::Owner => Err(AuditError::PermissionDenied(
                "The owner cannot leave the group, delete it instead".to_string(),
            )),
            MemberRole::Admin | MemberRole::Member => {
                self.remove_member_from_group(&membership.id, group_id).await
            }
        }
    }

    /// Delete a group and everything scoped to it in one atomic batch
    pub async fn delete_group(&self, group_id: &str) -> Result<()> {
        let user = self.require_user().await?;
        let group = self.get_group(group_id).await?;
        if group.owner_id != user.uid {
            return Err(AuditError::PermissionDenied(
                "Only the group owner can delete the group".to_string(),
            ));
        }

        let mut batch = vec![DocumentRef::new(Collection::Groups, group_id)];
        for collection in [
            Collection::GroupMembers,
            Collection::WeeklyAuditors,
            Collection::ChatMessages,
        ] {
            let scoped = self
                .store
                .query_eq(collection, "groupId", &Value::String(group_id.to_string()))
                .await?;
            batch.extend(
                scoped
                    .iter()
                    .filter_map(|document| document.get("id").and_then(Value::as_str))
                    .map(|id| DocumentRef::new(collection, id)),
            );
        }

        self.store.delete_batch(&batch).await?;
        log_group_event(
            group_id,
            "deleted",
            Some(&user.uid),
            Some(&format!("{} documents", batch.len())),
        );
        Ok(())
    }

    /// Groups the signed-in user belongs to, most recently joined first
    pub async fn get_user_groups(&self) -> Result<Vec<Group>> {
        let user = self.require_user().await?;
        let mut memberships =
            query_documents::<GroupMember>(self.store(), "userId", &user.uid).await?;
        memberships.sort_by(|a, b| b.joined_at.cmp(&a.joined_at));

        let mut groups = Vec::with_capacity(memberships.len());
        for membership in memberships {
            match get_document::<Group>(self.store(), &membership.group_id).await? {
                Some(group) => groups.push(group),
                None => {
                    warn!(membership_id = %membership.id, "Membership points at a missing group")
                }
            }
        }
        Ok(groups)
    }

    // --- members -------------------------------------------------------

    /// Owner first, then admins, then members; each by join time
    pub async fn get_group_members(&self, group_id: &str) -> Result<Vec<GroupMember>> {
        let mut members = query_documents::<GroupMember>(self.store(), "groupId", group_id).await?;
        members.sort_by(|a, b| {
            a.role
                .rank()
                .cmp(&b.role.rank())
                .then(a.joined_at.cmp(&b.joined_at))
        });
        Ok(members)
    }

    async fn find_membership(&self, group_id: &str, user_id: &str) -> Result<Option<GroupMember>> {
        Ok(query_documents::<GroupMember>(self.store(), "groupId", group_id)
            .await?
            .into_iter()
            .find(|member| member.user_id == user_id))
    }

    pub async fn update_group_member(&self, member: &GroupMember) -> Result<()> {
        put_document(self.store(), member).await?;
        log_group_event(&member.group_id, "member_updated", Some(&member.user_id), None);
        Ok(())
    }

    /// Delete a membership, then decrement the member count (never below 0).
    /// Returns the new member count.
    pub async fn remove_member_from_group(
        &self,
        membership_id: &str,
        group_id: &str,
    ) -> Result<i64> {
        self.store.delete(Collection::GroupMembers, membership_id).await?;
        let count = self
            .store
            .increment_clamped(Collection::Groups, group_id, "memberCount", -1, 0)
            .await?;

        log_group_event(group_id, "member_removed", None, Some(membership_id));
        Ok(count)
    }

    // --- profile -------------------------------------------------------

    /// Rename a user everywhere the display name is copied.
    ///
    /// Touches the profile, memberships, authored chat messages, owned
    /// groups and weekly auditor slots. A failure rolls back every write
    /// already made and returns the error.
    pub async fn update_user_profile(&self, user_id: &str, new_display_name: &str) -> Result<()> {
        let new_name = normalize_whitespace(new_display_name);
        if new_name.is_empty() {
            return Err(AuditError::Validation("Display name is required".to_string()));
        }

        let targets = [
            (Collection::Users, "uid", "displayName"),
            (Collection::GroupMembers, "userId", "userName"),
            (Collection::ChatMessages, "senderId", "senderName"),
            (Collection::Groups, "ownerId", "ownerName"),
            (Collection::WeeklyAuditors, "auditorId", "auditorName"),
        ];

        let mut saga = Saga::new(self.store(), "update_user_profile");
        let outcome = async {
            for (collection, owner_field, name_field) in targets {
                let documents = self
                    .store
                    .query_eq(collection, owner_field, &Value::String(user_id.to_string()))
                    .await?;
                for previous in documents {
                    let id = previous
                        .get("id")
                        .or_else(|| previous.get("uid"))
                        .and_then(Value::as_str);
                    let id = match id {
                        Some(id) => id.to_string(),
                        None => continue,
                    };
                    let mut renamed = previous.clone();
                    if let Some(object) = renamed.as_object_mut() {
                        object.insert(name_field.to_string(), Value::String(new_name.clone()));
                    }
                    saga.put_with_previous(collection, &id, renamed, Some(previous)).await?;
                }
            }
            Ok::<_, AuditError>(())
        }
        .await;

        if let Err(e) = outcome {
            error!(user_id = user_id, error = %e, "Profile rename failed, rolling back");
            saga.compensate().await;
            return Err(e);
        }
        let updated = saga.commit();

        let mut session = self.session.write().await;
        if let Some(current) = session.as_mut().filter(|current| current.uid == user_id) {
            current.display_name = new_name;
        }
        info!(user_id = user_id, documents = updated, "Display name updated");
        Ok(())
    }

    // --- weekly auditors -----------------------------------------------

    /// Ordered Monday to Sunday
    pub async fn get_weekly_auditors(&self, group_id: &str) -> Result<Vec<WeeklyAuditor>> {
        let mut auditors =
            query_documents::<WeeklyAuditor>(self.store(), "groupId", group_id).await?;
        auditors.sort_by_key(|auditor| auditor.week_day);
        Ok(auditors)
    }

    /// Store an assignment, replacing any other assignment for the same
    /// (group, weekday) slot.
    pub async fn save_weekly_auditor(&self, assignment: &WeeklyAuditor) -> Result<WeeklyAuditor> {
        if !(1..=WEEK_DAYS).contains(&assignment.week_day) {
            return Err(AuditError::Validation(format!(
                "Week day must be between 1 and {}, got {}",
                WEEK_DAYS, assignment.week_day
            )));
        }

        let mut stored = assignment.clone();
        if stored.id.is_empty() {
            stored.id = generate_id();
        }

        let same_slot: Vec<WeeklyAuditor> = self
            .get_weekly_auditors(&assignment.group_id)
            .await?
            .into_iter()
            .filter(|existing| existing.week_day == assignment.week_day && existing.id != stored.id)
            .collect();

        // Reuse the slot's id so the write replaces it.
        if let Some((first, rest)) = same_slot.split_first() {
            stored.id = first.id.clone();
            for duplicate in rest {
                self.store.delete(Collection::WeeklyAuditors, &duplicate.id).await?;
            }
        }

        put_document(self.store(), &stored).await?;
        log_group_event(
            &stored.group_id,
            "weekly_auditor_saved",
            Some(&stored.auditor_id),
            Some(stored.day_name()),
        );
        Ok(stored)
    }

    /// The auditor on duty for `date`'s weekday, if one is assigned
    pub async fn get_auditor_for_date(
        &self,
        group_id: &str,
        date: NaiveDate,
    ) -> Result<Option<WeeklyAuditor>> {
        let week_day = date.weekday().number_from_monday() as u8;
        Ok(self
            .get_weekly_auditors(group_id)
            .await?
            .into_iter()
            .find(|auditor| auditor.week_day == week_day))
    }

    // --- chat ----------------------------------------------------------

    /// The newest `limit` messages of a group, oldest first
    pub async fn get_chat_messages(
        &self,
        group_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatMessage>> {
        let mut messages =
            query_documents::<ChatMessage>(self.store(), "groupId", group_id).await?;
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        messages.truncate(limit);
        messages.reverse();
        Ok(messages)
    }

    /// [`Self::get_chat_messages`] with the configured page size
    pub async fn get_recent_chat_messages(&self, group_id: &str) -> Result<Vec<ChatMessage>> {
        self.get_chat_messages(group_id, self.config.chat_page_size).await
    }

    pub async fn save_chat_message(&self, message: &ChatMessage) -> Result<ChatMessage> {
        if message.message.trim().is_empty() {
            return Err(AuditError::Validation("Message cannot be empty".to_string()));
        }

        let mut stored = message.clone();
        if stored.id.is_empty() {
            stored.id = generate_id();
        }
        put_document(self.store(), &stored).await?;
        debug!(group_id = %stored.group_id, message_id = %stored.id, "Chat message saved");
        Ok(stored)
    }

    pub async fn send_text_message(&self, group_id: &str, text: &str) -> Result<ChatMessage> {
        let user = self.require_user().await?;
        self.save_chat_message(&message_from(&user, group_id, text.trim(), MessageType::Text))
            .await
    }

    /// `photo_ref` is the stored photo's reference, not its bytes
    pub async fn send_photo_message(&self, group_id: &str, photo_ref: &str) -> Result<ChatMessage> {
        let user = self.require_user().await?;
        self.save_chat_message(&message_from(&user, group_id, photo_ref, MessageType::Image))
            .await
    }

    async fn post_system_message(&self, group_id: &str, text: &str) -> Result<ChatMessage> {
        let message = ChatMessage {
            id: generate_id(),
            group_id: group_id.to_string(),
            sender_id: "system".to_string(),
            sender_name: "System".to_string(),
            sender_avatar: None,
            message: text.to_string(),
            message_type: MessageType::System,
            created_at: Utc::now(),
        };
        self.save_chat_message(&message).await
    }
}

fn message_from(
    user: &AppUser,
    group_id: &str,
    body: &str,
    message_type: MessageType,
) -> ChatMessage {
    ChatMessage {
        id: generate_id(),
        group_id: group_id.to_string(),
        sender_id: user.uid.clone(),
        sender_name: user.display_name.clone(),
        sender_avatar: user.photo_url.clone(),
        message: body.to_string(),
        message_type,
        created_at: Utc::now(),
    }
}
