//! # Actions and the merge precedence table
//!
//! Every moderation decision, whether proposed by a checker, issued by a
//! command, or composed out of several proposals, is an [`Action`]. When
//! multiple checkers flag the same item, [`merge`] reduces the proposals to
//! one composite action carrying the union of the deserved consequences.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ModError, Result};
use crate::models::{ContentKind, ContentRef, ForumRef, UserRef};
use crate::role::ForumRole;

/// Closed set of moderation decisions.
///
/// The `*AndBan` variants remove content and sanction its author in one
/// composite decision; [`merge`] is the only place they arise from separate
/// proposals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    None,
    HideThread,
    DeleteThread,
    DeleteThreadAndBan,
    DeletePost,
    DeletePostAndBan,
    DeleteComment,
    DeleteCommentAndBan,
    Ban,
    Blacklist,
    PermissionEdit,
}

impl ActionKind {
    /// Every kind, for exhaustive table tests.
    pub const ALL: [ActionKind; 11] = [
        ActionKind::None,
        ActionKind::HideThread,
        ActionKind::DeleteThread,
        ActionKind::DeleteThreadAndBan,
        ActionKind::DeletePost,
        ActionKind::DeletePostAndBan,
        ActionKind::DeleteComment,
        ActionKind::DeleteCommentAndBan,
        ActionKind::Ban,
        ActionKind::Blacklist,
        ActionKind::PermissionEdit,
    ];

    /// Removal actions take the content down (hide or delete, any level).
    pub fn is_removal(self) -> bool {
        matches!(
            self,
            ActionKind::HideThread
                | ActionKind::DeleteThread
                | ActionKind::DeleteThreadAndBan
                | ActionKind::DeletePost
                | ActionKind::DeletePostAndBan
                | ActionKind::DeleteComment
                | ActionKind::DeleteCommentAndBan
        )
    }

    /// Whether the author is additionally sanctioned.
    pub fn implies_ban(self) -> bool {
        matches!(
            self,
            ActionKind::DeleteThreadAndBan
                | ActionKind::DeletePostAndBan
                | ActionKind::DeleteCommentAndBan
                | ActionKind::Ban
        )
    }

    /// The content level a removal applies to.
    pub fn content_kind(self) -> Option<ContentKind> {
        match self {
            ActionKind::HideThread
            | ActionKind::DeleteThread
            | ActionKind::DeleteThreadAndBan => Some(ContentKind::Thread),
            ActionKind::DeletePost | ActionKind::DeletePostAndBan => Some(ContentKind::Post),
            ActionKind::DeleteComment | ActionKind::DeleteCommentAndBan => {
                Some(ContentKind::Comment)
            }
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::None => "none",
            ActionKind::HideThread => "hide_thread",
            ActionKind::DeleteThread => "delete_thread",
            ActionKind::DeleteThreadAndBan => "delete_thread_and_ban",
            ActionKind::DeletePost => "delete_post",
            ActionKind::DeletePostAndBan => "delete_post_and_ban",
            ActionKind::DeleteComment => "delete_comment",
            ActionKind::DeleteCommentAndBan => "delete_comment_and_ban",
            ActionKind::Ban => "ban",
            ActionKind::Blacklist => "blacklist",
            ActionKind::PermissionEdit => "permission_edit",
        }
    }

    /// The and-ban composite of a removal. Hiding has no ban variant, so a
    /// hide escalates to the thread deletion composite.
    fn and_ban(self) -> Option<ActionKind> {
        match self {
            ActionKind::HideThread | ActionKind::DeleteThread => {
                Some(ActionKind::DeleteThreadAndBan)
            }
            ActionKind::DeletePost => Some(ActionKind::DeletePostAndBan),
            ActionKind::DeleteComment => Some(ActionKind::DeleteCommentAndBan),
            _ => None,
        }
    }
}

/// The remote API only accepts a fixed menu of ban durations; requested
/// day counts collapse onto it. −1 is permanent.
pub fn clamp_ban_days(days: i32) -> i32 {
    if days <= -1 {
        -1
    } else if days < 3 {
        1
    } else if days < 5 {
        3
    } else if days < 90 {
        10
    } else {
        90
    }
}

/// One proposed or composite moderation decision.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub kind: ActionKind,
    /// The content acted on; required unless the kind is `None` or the
    /// action is user-level with `forum` + `user` set instead.
    pub target: Option<ContentRef>,
    /// Sanction subject when not derivable from `target`.
    pub user: Option<UserRef>,
    /// Forum scope for user-level actions without a content target.
    pub forum: Option<ForumRef>,
    /// −1 is permanent. Meaningful only when the kind implies a sanction.
    pub ban_days: Option<i32>,
    /// Payload of `PermissionEdit`.
    pub new_role: Option<ForumRole>,
    /// Provenance: which checker(s)/command produced this decision.
    pub notes: BTreeSet<String>,
    /// Producing subsystem, for the audit trail.
    pub plugin: String,
    /// Human issuer when a command triggered this; shown next to the
    /// executing account in the audit trail.
    pub sender: Option<String>,
}

impl Action {
    fn blank(kind: ActionKind) -> Action {
        Action {
            kind,
            target: None,
            user: None,
            forum: None,
            ban_days: None,
            new_role: None,
            notes: BTreeSet::new(),
            plugin: "review".to_string(),
            sender: None,
        }
    }

    /// No objection.
    pub fn none() -> Action {
        Action::blank(ActionKind::None)
    }

    /// Hide a thread without deleting it.
    pub fn hide(target: ContentRef, note: &str) -> Result<Action> {
        if target.kind != ContentKind::Thread {
            return Err(ModError::Contract(format!(
                "hide applies to threads, got {:?}",
                target.kind
            )));
        }
        let mut action = Action::blank(ActionKind::HideThread);
        action.target = Some(target);
        action.notes.insert(note.to_string());
        Ok(action)
    }

    /// Delete a content item; the kind follows the target's level.
    pub fn delete(target: ContentRef, note: &str) -> Action {
        let kind = match target.kind {
            ContentKind::Thread => ActionKind::DeleteThread,
            ContentKind::Post => ActionKind::DeletePost,
            ContentKind::Comment => ActionKind::DeleteComment,
        };
        let mut action = Action::blank(kind);
        action.target = Some(target);
        action.notes.insert(note.to_string());
        action
    }

    /// Delete a content item and ban its author. A zero day count means no
    /// ban was requested and yields a plain deletion.
    pub fn delete_and_ban(target: ContentRef, days: i32, note: &str) -> Action {
        if days == 0 {
            return Action::delete(target, note);
        }
        let kind = match target.kind {
            ContentKind::Thread => ActionKind::DeleteThreadAndBan,
            ContentKind::Post => ActionKind::DeletePostAndBan,
            ContentKind::Comment => ActionKind::DeleteCommentAndBan,
        };
        let mut action = Action::blank(kind);
        action.target = Some(target);
        action.ban_days = Some(clamp_ban_days(days));
        action.notes.insert(note.to_string());
        action
    }

    /// Ban a user from a forum for a number of days.
    pub fn ban(forum: ForumRef, user: UserRef, days: i32, note: &str) -> Action {
        let mut action = Action::blank(ActionKind::Ban);
        action.forum = Some(forum);
        action.user = Some(user);
        action.ban_days = Some(clamp_ban_days(days));
        action.notes.insert(note.to_string());
        action
    }

    /// Put a user on the forum's blacklist.
    pub fn blacklist(forum: ForumRef, user: UserRef, note: &str) -> Action {
        let mut action = Action::blank(ActionKind::Blacklist);
        action.forum = Some(forum);
        action.user = Some(user);
        action.notes.insert(note.to_string());
        action
    }

    /// Rewrite a user's standing inside a forum.
    pub fn set_role(forum: ForumRef, user: UserRef, role: ForumRole, note: &str) -> Action {
        let mut action = Action::blank(ActionKind::PermissionEdit);
        action.forum = Some(forum);
        action.user = Some(user);
        action.new_role = Some(role);
        action.notes.insert(note.to_string());
        action
    }

    pub fn with_plugin(mut self, plugin: &str) -> Action {
        self.plugin = plugin.to_string();
        self
    }

    pub fn with_sender(mut self, sender: &str) -> Action {
        self.sender = Some(sender.to_string());
        self
    }

    /// The joined provenance notes.
    pub fn note(&self) -> String {
        self.notes.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

/// Append-only record of one executed action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub plugin: String,
    pub actor: String,
    pub kind: ActionKind,
    pub object: String,
    pub note: String,
    pub at: DateTime<Utc>,
}

/// Reduces two proposals for the same item into one composite decision.
///
/// The precedence table is symmetric: the directed half is tried both ways,
/// and any pair it leaves undefined is a contract violation, never a guess.
pub fn merge(a: Action, b: Action) -> Result<Action> {
    if let Some(merged) = merge_directed(&a, &b) {
        return Ok(merged);
    }
    if let Some(merged) = merge_directed(&b, &a) {
        return Ok(merged);
    }
    Err(ModError::Contract(format!(
        "no precedence between {:?} and {:?}",
        a.kind, b.kind
    )))
}

/// Folds any number of proposals for one item into a single composite.
pub fn merge_all<I>(proposals: I) -> Result<Action>
where
    I: IntoIterator<Item = Action>,
{
    proposals.into_iter().try_fold(Action::none(), merge)
}

/// The directed half of the precedence table.
fn merge_directed(a: &Action, b: &Action) -> Option<Action> {
    use ActionKind::*;

    match (a.kind, b.kind) {
        // no objection loses to anything
        (None, _) => Some(absorb_notes(b.clone(), a)),

        // a removal plus a standalone ban composes into the and-ban
        // variant of the removal, days taken from the ban side
        (HideThread | DeleteThread | DeletePost | DeleteComment, Ban) => {
            let mut merged = a.clone();
            // and_ban is defined for every kind this arm matches
            merged.kind = a.kind.and_ban()?;
            merged.ban_days = b.ban_days;
            Some(absorb_notes(merged, b))
        }

        // the stronger removal of the same item wins
        (HideThread, DeleteThread | DeleteThreadAndBan)
        | (DeleteThread, DeleteThreadAndBan)
        | (DeletePost, DeletePostAndBan)
        | (DeleteComment, DeleteCommentAndBan) => Some(absorb_notes(b.clone(), a)),

        // duplicate removals collapse to one
        (HideThread, HideThread)
        | (DeleteThread, DeleteThread)
        | (DeletePost, DeletePost)
        | (DeleteComment, DeleteComment) => Some(absorb_notes(a.clone(), b)),

        // equal-severity composites: keep one, dominant ban, all notes
        (DeleteThreadAndBan, DeleteThreadAndBan)
        | (DeletePostAndBan, DeletePostAndBan)
        | (DeleteCommentAndBan, DeleteCommentAndBan)
        | (Ban, Ban) => {
            let mut merged = a.clone();
            merged.ban_days = dominant_days(a.ban_days, b.ban_days);
            Some(absorb_notes(merged, b))
        }

        _ => Option::None,
    }
}

/// The harsher of two ban durations; permanent dominates everything.
fn dominant_days(a: Option<i32>, b: Option<i32>) -> Option<i32> {
    match (a, b) {
        (Some(-1), _) | (_, Some(-1)) => Some(-1),
        (Some(x), Some(y)) => Some(x.max(y)),
        (Some(x), Option::None) | (Option::None, Some(x)) => Some(x),
        (Option::None, Option::None) => Option::None,
    }
}

fn absorb_notes(mut winner: Action, loser: &Action) -> Action {
    winner.notes.extend(loser.notes.iter().cloned());
    winner
}
