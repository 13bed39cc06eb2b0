//! # Ranked forum permissions
//!
//! A single strictly-ordered enumeration; membership tests like "small
//! admin or above" are ordinal comparisons, never bit arithmetic.

use serde::{Deserialize, Serialize};

/// Permission ranks, weakest first so that `derive(Ord)` gives the
/// intended ordering.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Rank {
    Ordinary,
    TrustedCreator,
    MinAdmin,
    HighAdmin,
    SuperAdmin,
    Master,
}

impl Rank {
    pub fn as_str(self) -> &'static str {
        match self {
            Rank::Ordinary => "ordinary",
            Rank::TrustedCreator => "trusted_creator",
            Rank::MinAdmin => "min_admin",
            Rank::HighAdmin => "high_admin",
            Rank::SuperAdmin => "super_admin",
            Rank::Master => "master",
        }
    }

    pub fn parse(value: &str) -> Option<Rank> {
        match value {
            "ordinary" => Some(Rank::Ordinary),
            "trusted_creator" => Some(Rank::TrustedCreator),
            "min_admin" => Some(Rank::MinAdmin),
            "high_admin" => Some(Rank::HighAdmin),
            "super_admin" => Some(Rank::SuperAdmin),
            "master" => Some(Rank::Master),
            _ => None,
        }
    }
}

/// A user's standing inside one forum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumRole {
    pub rank: Rank,
    /// Orthogonal to rank: a blacklisted user keeps whatever rank row they
    /// had.
    pub blacklisted: bool,
}

impl ForumRole {
    pub fn new(rank: Rank) -> Self {
        ForumRole {
            rank,
            blacklisted: false,
        }
    }

    /// Maps the human-readable labels accepted by the permission command.
    /// The master label resolves but is rejected at the command layer.
    pub fn from_label(label: &str) -> Option<ForumRole> {
        match label {
            "超级管理员" => Some(ForumRole::new(Rank::Master)),
            "大吧主" => Some(ForumRole::new(Rank::SuperAdmin)),
            "高权限小吧主" => Some(ForumRole::new(Rank::HighAdmin)),
            "小吧主" => Some(ForumRole::new(Rank::MinAdmin)),
            "创作者" => Some(ForumRole::new(Rank::TrustedCreator)),
            "黑名单" => Some(ForumRole {
                rank: Rank::Ordinary,
                blacklisted: true,
            }),
            _ => None,
        }
    }
}

impl Default for ForumRole {
    /// Users with no stored standing are ordinary members.
    fn default() -> Self {
        ForumRole::new(Rank::Ordinary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_ordering_is_ordinal() {
        assert!(Rank::Ordinary < Rank::TrustedCreator);
        assert!(Rank::TrustedCreator < Rank::MinAdmin);
        assert!(Rank::MinAdmin < Rank::HighAdmin);
        assert!(Rank::HighAdmin < Rank::SuperAdmin);
        assert!(Rank::SuperAdmin < Rank::Master);
        // the membership test used by gating
        assert!(Rank::HighAdmin >= Rank::MinAdmin);
        assert!(!(Rank::Ordinary >= Rank::MinAdmin));
    }

    #[test]
    fn test_rank_round_trips_through_strings() {
        for rank in [
            Rank::Ordinary,
            Rank::TrustedCreator,
            Rank::MinAdmin,
            Rank::HighAdmin,
            Rank::SuperAdmin,
            Rank::Master,
        ] {
            assert_eq!(Rank::parse(rank.as_str()), Some(rank));
        }
        assert_eq!(Rank::parse("bogus"), None);
    }

    #[test]
    fn test_labels_map_to_roles() {
        assert_eq!(
            ForumRole::from_label("小吧主"),
            Some(ForumRole::new(Rank::MinAdmin))
        );
        let black = ForumRole::from_label("黑名单").unwrap();
        assert!(black.blacklisted);
        assert_eq!(black.rank, Rank::Ordinary);
        assert_eq!(ForumRole::from_label("路人"), None);
    }
}
