use std::fmt;

use serde::Serialize;

use super::{Coins, DrawingId, UserId};

/// Result of the like transaction as seen by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeOutcome {
    /// Like recorded; the owner was credited
    Recorded { owner_id: UserId, like_count: i64 },
    /// A like for this (user, drawing) pair already exists
    AlreadyLiked,
    DrawingMissing,
}

/// Result of the purchase transaction as seen by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseOutcome {
    Purchased { new_balance: Coins },
    /// A purchase for this (user, item) pair already exists
    AlreadyOwned,
    InsufficientFunds { balance: Coins },
}

/// Global counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total_users: i64,
    pub total_drawings: i64,
    pub total_likes: i64,
}

/// Drawing whose stored counter disagrees with its like facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterMismatch {
    pub drawing_id: DrawingId,
    pub recorded: i64,
    pub actual: i64,
}

/// Raw figures gathered from the store for an integrity check.
#[derive(Debug, Clone, Default)]
pub struct IntegrityStats {
    pub user_count: i64,
    pub drawing_count: i64,
    pub like_count: i64,
    pub purchase_count: i64,
    pub counter_mismatches: Vec<CounterMismatch>,
    pub negative_balances: Vec<(UserId, Coins)>,
    pub duplicate_likes: i64,
    pub duplicate_purchases: i64,
    pub dangling_likes: i64,
    pub dangling_purchases: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityIssue {
    LikeCounterMismatch(CounterMismatch),
    NegativeBalance { user_id: UserId, balance: Coins },
    DuplicateLikes(i64),
    DuplicatePurchases(i64),
    DanglingLikes(i64),
    DanglingPurchases(i64),
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityIssue::LikeCounterMismatch(m) => write!(
                f,
                "drawing {} records {} likes but has {} like facts",
                m.drawing_id, m.recorded, m.actual
            ),
            IntegrityIssue::NegativeBalance { user_id, balance } => {
                write!(f, "user {} has negative balance {}", user_id, balance)
            }
            IntegrityIssue::DuplicateLikes(n) => {
                write!(f, "{} (user, drawing) pairs liked more than once", n)
            }
            IntegrityIssue::DuplicatePurchases(n) => {
                write!(f, "{} (user, item) pairs purchased more than once", n)
            }
            IntegrityIssue::DanglingLikes(n) => {
                write!(f, "{} likes reference missing users or drawings", n)
            }
            IntegrityIssue::DanglingPurchases(n) => {
                write!(f, "{} purchases reference missing users or items", n)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct IntegrityReport {
    pub user_count: i64,
    pub drawing_count: i64,
    pub like_count: i64,
    pub purchase_count: i64,
    pub issues: Vec<IntegrityIssue>,
}

impl IntegrityReport {
    pub fn is_healthy(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Turn raw store figures into a report listing every broken invariant.
pub fn build_integrity_report(stats: &IntegrityStats) -> IntegrityReport {
    let mut issues: Vec<IntegrityIssue> = stats
        .counter_mismatches
        .iter()
        .copied()
        .map(IntegrityIssue::LikeCounterMismatch)
        .collect();

    issues.extend(
        stats
            .negative_balances
            .iter()
            .map(|&(user_id, balance)| IntegrityIssue::NegativeBalance { user_id, balance }),
    );

    if stats.duplicate_likes > 0 {
        issues.push(IntegrityIssue::DuplicateLikes(stats.duplicate_likes));
    }
    if stats.duplicate_purchases > 0 {
        issues.push(IntegrityIssue::DuplicatePurchases(stats.duplicate_purchases));
    }
    if stats.dangling_likes > 0 {
        issues.push(IntegrityIssue::DanglingLikes(stats.dangling_likes));
    }
    if stats.dangling_purchases > 0 {
        issues.push(IntegrityIssue::DanglingPurchases(stats.dangling_purchases));
    }

    IntegrityReport {
        user_count: stats.user_count,
        drawing_count: stats.drawing_count,
        like_count: stats.like_count,
        purchase_count: stats.purchase_count,
        issues,
    }
}
