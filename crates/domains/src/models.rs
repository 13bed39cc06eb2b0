//! # Domain Models
//!
//! Views of remote forum content as the capability client reports them.
//! All content identity comes from the platform (signed 64-bit ids);
//! nothing here is minted locally.

use serde::{Deserialize, Serialize};

/// The remote API inlines at most this many comments per post when a post
/// listing is fetched with comments.
pub const INLINE_COMMENT_LIMIT: u32 = 10;

/// Comments per page on the remote comment endpoint.
pub const COMMENT_PAGE_SIZE: u32 = 30;

/// Posts per page on the remote post endpoint.
pub const POST_PAGE_SIZE: u32 = 30;

/// The mention feed truncates bodies at this many UTF-8 bytes; a mention
/// this long needs a follow-up fetch for its full text.
pub const MENTION_TRUNCATION_BYTES: usize = 78;

/// The three levels of forum content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Thread,
    Post,
    Comment,
}

/// A forum identified by numeric id and display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumRef {
    pub fid: i64,
    pub name: String,
}

/// Author identity as reported by the remote platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub user_id: i64,
    pub name: String,
    /// Platform experience level inside the forum, 1..=18.
    pub level: u8,
}

/// A user referenced by id or by display name; commands accept either.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserRef {
    Id(i64),
    Name(String),
}

/// A top-level thread as listed on a forum's front page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadView {
    pub tid: i64,
    pub forum: ForumRef,
    pub title: String,
    pub text: String,
    pub author: UserIdentity,
    /// Epoch seconds of the newest activity anywhere in the thread.
    pub last_activity: i64,
    /// Live broadcasts are never inspected.
    pub is_live: bool,
}

/// One reply floor inside a thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
    pub pid: i64,
    pub tid: i64,
    pub forum: ForumRef,
    /// 1-based floor number; floor 1 is the opening post.
    pub floor: u32,
    pub reply_count: u32,
    pub author: UserIdentity,
    pub text: String,
    /// Up to [`INLINE_COMMENT_LIMIT`] comments inlined by the listing fetch.
    pub comments: Vec<CommentView>,
}

/// A reply nested under a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    pub pid: i64,
    /// The owning post.
    pub parent_pid: i64,
    pub tid: i64,
    pub forum: ForumRef,
    pub author: UserIdentity,
    pub text: String,
}

/// One entry of the listener account's @mention feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mention {
    pub forum: ForumRef,
    pub tid: i64,
    /// The mentioning post/comment; equals `tid`'s opening post for thread
    /// mentions.
    pub pid: i64,
    /// What kind of content carried the mention.
    pub kind: ContentKind,
    pub author: UserIdentity,
    /// Possibly truncated body, see [`MENTION_TRUNCATION_BYTES`].
    pub text: String,
    /// Epoch seconds.
    pub created_at: i64,
}

/// Sort order for a post listing fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostSort {
    Ascending,
    Descending,
    Hot,
}

/// Page selection for `ForumClient::list_posts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostQuery {
    /// 1-based page index, interpreted under `sort`.
    pub page: u32,
    /// Posts per page; the remote clamps to its own maximum. Zero fetches
    /// only the thread envelope.
    pub count: u32,
    pub sort: PostSort,
    /// Inline up to [`INLINE_COMMENT_LIMIT`] comments per post.
    pub with_comments: bool,
}

impl PostQuery {
    /// The newest page of a thread, comments inlined.
    pub fn newest() -> Self {
        PostQuery {
            page: 1,
            count: POST_PAGE_SIZE,
            sort: PostSort::Descending,
            with_comments: true,
        }
    }

    /// The oldest `count` posts, comments inlined.
    pub fn oldest(count: u32) -> Self {
        PostQuery {
            page: 1,
            count,
            sort: PostSort::Ascending,
            with_comments: true,
        }
    }

    /// The remote's "hot replies" selection, comments inlined.
    pub fn hot() -> Self {
        PostQuery {
            page: 1,
            count: POST_PAGE_SIZE,
            sort: PostSort::Hot,
            with_comments: true,
        }
    }

    /// Only the owning thread, no posts.
    pub fn envelope() -> Self {
        PostQuery {
            page: 1,
            count: 0,
            sort: PostSort::Ascending,
            with_comments: false,
        }
    }
}

/// A page of posts together with the thread that owns them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostListing {
    pub thread: ThreadView,
    pub posts: Vec<PostView>,
}

/// A page of comments together with the post that owns them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentListing {
    pub parent: PostView,
    pub comments: Vec<CommentView>,
}

/// Normalized identity of one content item, carried by an `Action` target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRef {
    pub kind: ContentKind,
    pub forum: ForumRef,
    pub tid: i64,
    /// Post or comment id; `None` for threads.
    pub pid: Option<i64>,
    /// Owning post, for comments only.
    pub parent_pid: Option<i64>,
    pub author: UserIdentity,
    pub text: String,
}

impl ContentRef {
    pub fn from_thread(thread: &ThreadView) -> Self {
        ContentRef {
            kind: ContentKind::Thread,
            forum: thread.forum.clone(),
            tid: thread.tid,
            pid: None,
            parent_pid: None,
            author: thread.author.clone(),
            text: thread.text.clone(),
        }
    }

    pub fn from_post(post: &PostView) -> Self {
        ContentRef {
            kind: ContentKind::Post,
            forum: post.forum.clone(),
            tid: post.tid,
            pid: Some(post.pid),
            parent_pid: None,
            author: post.author.clone(),
            text: post.text.clone(),
        }
    }

    pub fn from_comment(comment: &CommentView) -> Self {
        ContentRef {
            kind: ContentKind::Comment,
            forum: comment.forum.clone(),
            tid: comment.tid,
            pid: Some(comment.pid),
            parent_pid: Some(comment.parent_pid),
            author: comment.author.clone(),
            text: comment.text.clone(),
        }
    }

    /// `forum:id:author`, the object column of the audit trail.
    pub fn describe(&self) -> String {
        format!(
            "{}:{}:{}",
            self.forum.name,
            self.pid.unwrap_or(self.tid),
            self.author.name
        )
    }
}

/// Durable watermark for one thread: inspected up to this activity time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadCursor {
    pub tid: i64,
    pub fid: i64,
    /// Epoch seconds; never decreases over the life of the cursor.
    pub last_activity: i64,
}

/// Durable watermark for one post: comments inspected up to this count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostCursor {
    pub pid: i64,
    pub tid: i64,
    /// Never decreases over the life of the cursor.
    pub reply_count: u32,
}

/// Character-bounded preview of content text for log and audit lines.
pub fn cut_text(text: &str, max_chars: usize, ellipsis: &str) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{cut}{ellipsis}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author() -> UserIdentity {
        UserIdentity {
            user_id: 77,
            name: "someone".into(),
            level: 4,
        }
    }

    #[test]
    fn test_content_ref_describe_uses_pid_for_posts() {
        let post = PostView {
            pid: 900,
            tid: 10,
            forum: ForumRef {
                fid: 1,
                name: "rust".into(),
            },
            floor: 2,
            reply_count: 0,
            author: author(),
            text: "hello".into(),
            comments: vec![],
        };
        let item = ContentRef::from_post(&post);
        assert_eq!(item.describe(), "rust:900:someone");
    }

    #[test]
    fn test_cut_text_keeps_short_strings_whole() {
        assert_eq!(cut_text("short", 50, "..."), "short");
        assert_eq!(cut_text("abcdef", 3, "..."), "abc...");
        // multi-byte safe: counts characters, not bytes
        assert_eq!(cut_text("广告广告", 2, "…"), "广告…");
    }
}
