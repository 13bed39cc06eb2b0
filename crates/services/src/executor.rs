//! # Action executor
//!
//! Carries one composite decision out against the remote forum API and
//! appends exactly one audit record, unless dry-run mode suppresses both.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use domains::{
    cut_text, Action, ActionKind, AuditRecord, AuditSink, ContentRef, ForumClient, ModError,
    Result, RoleStore, UserIdentity,
};

/// Preview length for content text in audit notes.
const NOTE_PREVIEW_CHARS: usize = 50;

pub struct Executor {
    client: Arc<dyn ForumClient>,
    audit: Arc<dyn AuditSink>,
    roles: Arc<dyn RoleStore>,
    dry_run: bool,
}

impl Executor {
    pub fn new(
        client: Arc<dyn ForumClient>,
        audit: Arc<dyn AuditSink>,
        roles: Arc<dyn RoleStore>,
        dry_run: bool,
    ) -> Self {
        Executor {
            client,
            audit,
            roles,
            dry_run,
        }
    }

    /// Executes the action and returns its audit record. `Ok(None)` means
    /// nothing was executed: an empty action, dry-run mode, or a remote
    /// refusal that is tolerated (content already gone, rate limit).
    pub async fn execute(&self, action: &Action) -> Result<Option<AuditRecord>> {
        if action.kind == ActionKind::None && action.notes.is_empty() {
            return Ok(None);
        }
        if self.dry_run {
            debug!(
                kind = action.kind.as_str(),
                note = %action.note(),
                "dry-run: decision not executed"
            );
            return Ok(None);
        }
        match self.run_remote(action).await {
            Ok(record) => {
                self.audit.record(&record).await?;
                info!(
                    kind = record.kind.as_str(),
                    actor = %record.actor,
                    object = %record.object,
                    "action executed"
                );
                Ok(Some(record))
            }
            Err(e) if e.is_transient() => {
                warn!(
                    kind = action.kind.as_str(),
                    error = %e,
                    "remote refused action; treated as not executed"
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// One external call sequence appropriate to the kind, then the audit
    /// record describing it.
    async fn run_remote(&self, action: &Action) -> Result<AuditRecord> {
        let me = self.client.self_identity().await?;

        let (object, note) = match action.kind {
            ActionKind::None => (String::new(), action.note()),

            ActionKind::HideThread => {
                let target = content_target(action)?;
                self.client.hide_thread(target.forum.fid, target.tid).await?;
                (target.describe(), content_note(action, target))
            }

            ActionKind::DeleteThread | ActionKind::DeleteThreadAndBan => {
                let target = content_target(action)?;
                self.client
                    .delete_thread(target.forum.fid, target.tid)
                    .await?;
                if action.kind.implies_ban() {
                    self.sanction_author(action, target).await?;
                }
                (target.describe(), content_note(action, target))
            }

            ActionKind::DeletePost
            | ActionKind::DeletePostAndBan
            | ActionKind::DeleteComment
            | ActionKind::DeleteCommentAndBan => {
                let target = content_target(action)?;
                let pid = target.pid.ok_or_else(|| {
                    ModError::Contract(format!("{:?} target without pid", action.kind))
                })?;
                self.client
                    .delete_post(target.forum.fid, target.tid, pid)
                    .await?;
                if action.kind.implies_ban() {
                    self.sanction_author(action, target).await?;
                }
                (target.describe(), content_note(action, target))
            }

            ActionKind::Ban => {
                let (forum, subject) = self.subject(action).await?;
                let days = action.ban_days.unwrap_or(1);
                self.client
                    .ban_user(&forum, subject.user_id, days, &action.note())
                    .await?;
                (format!("{}:{}", forum, subject.name), action.note())
            }

            ActionKind::Blacklist => {
                let (forum, subject) = self.subject(action).await?;
                self.client.add_to_blacklist(&forum, subject.user_id).await?;
                (format!("{}:{}", forum, subject.name), action.note())
            }

            ActionKind::PermissionEdit => {
                let role = action.new_role.ok_or_else(|| {
                    ModError::Contract("permission edit without a role payload".into())
                })?;
                let (forum, subject) = self.subject(action).await?;
                self.roles.upsert_role(subject.user_id, &forum, role).await?;
                (subject.name.clone(), action.note())
            }
        };

        Ok(AuditRecord {
            plugin: action.plugin.clone(),
            actor: actor_label(&me, action),
            kind: action.kind,
            object,
            note,
            at: Utc::now(),
        })
    }

    /// The author sanction half of a delete-and-ban composite.
    async fn sanction_author(&self, action: &Action, target: &ContentRef) -> Result<()> {
        let days = action.ban_days.unwrap_or(1);
        self.client
            .ban_user(
                &target.forum.name,
                target.author.user_id,
                days,
                &action.note(),
            )
            .await
    }

    /// Resolves the (forum, user) pair a user-level action applies to.
    async fn subject(&self, action: &Action) -> Result<(String, UserIdentity)> {
        let forum = action
            .forum
            .as_ref()
            .map(|f| f.name.clone())
            .or_else(|| action.target.as_ref().map(|t| t.forum.name.clone()))
            .ok_or_else(|| {
                ModError::Contract(format!("{:?} without a forum scope", action.kind))
            })?;

        let subject = match (&action.user, &action.target) {
            (Some(user), _) => self.client.user_info(user).await?,
            (None, Some(target)) => target.author.clone(),
            (None, None) => {
                return Err(ModError::Contract(format!(
                    "{:?} without a subject user",
                    action.kind
                )))
            }
        };
        Ok((forum, subject))
    }
}

fn content_target(action: &Action) -> Result<&ContentRef> {
    action.target.as_ref().ok_or_else(|| {
        ModError::Contract(format!("{:?} requires a content target", action.kind))
    })
}

fn content_note(action: &Action, target: &ContentRef) -> String {
    format!(
        "{} | {}",
        action.note(),
        cut_text(&target.text, NOTE_PREVIEW_CHARS, "...")
    )
}

/// `[sender]executor` when a command issuer rides on another account's
/// credential, otherwise just the executing account.
fn actor_label(me: &UserIdentity, action: &Action) -> String {
    match &action.sender {
        Some(sender) if *sender != me.name => format!("[{}]{}", sender, me.name),
        _ => me.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_label_prefixes_foreign_senders() {
        let me = UserIdentity {
            user_id: 1,
            name: "executor-account".into(),
            level: 18,
        };
        let mut action = Action::none();
        assert_eq!(actor_label(&me, &action), "executor-account");

        action.sender = Some("some-admin".into());
        assert_eq!(actor_label(&me, &action), "[some-admin]executor-account");

        action.sender = Some("executor-account".into());
        assert_eq!(actor_label(&me, &action), "executor-account");
    }

    #[test]
    fn test_missing_target_is_a_contract_violation() {
        let mut action = Action::none();
        action.kind = ActionKind::DeleteThread;
        let err = content_target(&action).unwrap_err();
        assert!(matches!(err, ModError::Contract(_)));
    }
}
