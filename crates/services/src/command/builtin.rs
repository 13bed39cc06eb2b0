//! Built-in commands. Each is registered by `CommandRegistry::standard`.

use async_trait::async_trait;
use tracing::info;

use domains::{Action, ForumRole, Rank, Result, UserRef};

use super::registry::{Command, Invocation};

/// Liveness probe; answers in the log only.
pub struct PingCommand;

#[async_trait]
impl Command for PingCommand {
    fn word(&self) -> &'static str {
        "ping"
    }

    fn min_rank(&self) -> Rank {
        Rank::MinAdmin
    }

    async fn run(&self, invocation: &mut Invocation<'_>) -> Result<Action> {
        info!(
            issuer = %invocation.mention.author.name,
            msg = invocation.args.first().map(String::as_str),
            "ping"
        );
        Ok(Action::none())
    }
}

/// Removes the content the mention was written under.
pub struct DeleteCommand;

#[async_trait]
impl Command for DeleteCommand {
    fn word(&self) -> &'static str {
        "删除"
    }

    fn min_rank(&self) -> Rank {
        Rank::MinAdmin
    }

    async fn run(&self, invocation: &mut Invocation<'_>) -> Result<Action> {
        let parent = invocation.parent().await?;
        Ok(Action::delete(parent, self.word()))
    }
}

/// Removes the parent content and bans its author. One optional positional
/// argument: the ban length in days, default 1.
pub struct DeleteBanCommand;

#[async_trait]
impl Command for DeleteBanCommand {
    fn word(&self) -> &'static str {
        "删封"
    }

    fn min_rank(&self) -> Rank {
        Rank::MinAdmin
    }

    async fn run(&self, invocation: &mut Invocation<'_>) -> Result<Action> {
        let days = match invocation.args.first() {
            Some(token) => match token.parse::<i32>() {
                Ok(days) => days,
                // malformed user input is ignored, not raised
                Err(_) => return Ok(Action::none()),
            },
            None => 1,
        };
        let parent = invocation.parent().await?;
        Ok(Action::delete_and_ban(parent, days, self.word()))
    }
}

/// Rewrites a user's standing in the forum. Two positional arguments: the
/// rank label and the user name.
pub struct SetRoleCommand;

#[async_trait]
impl Command for SetRoleCommand {
    fn word(&self) -> &'static str {
        "权限"
    }

    fn min_rank(&self) -> Rank {
        Rank::SuperAdmin
    }

    async fn run(&self, invocation: &mut Invocation<'_>) -> Result<Action> {
        let (Some(label), Some(user)) =
            (invocation.args.first(), invocation.args.get(1))
        else {
            return Ok(Action::none());
        };
        let Some(role) = ForumRole::from_label(label) else {
            return Ok(Action::none());
        };
        // the master rank is never granted through a forum command
        if role.rank == Rank::Master {
            return Ok(Action::none());
        }
        Ok(Action::set_role(
            invocation.mention.forum.clone(),
            UserRef::Name(user.clone()),
            role,
            label,
        ))
    }
}
