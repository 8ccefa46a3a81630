//! Report model
//!
//! One report per user per calendar day, made of an optional morning and an
//! optional evening half. A rejected half is removed, never flagged.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::errors::{ReportBuddyError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "report_half", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Half {
    Morning,
    Evening,
}

impl Half {
    pub fn as_str(&self) -> &'static str {
        match self {
            Half::Morning => "morning",
            Half::Evening => "evening",
        }
    }

    /// Compact form used in callback payloads
    pub fn code(&self) -> char {
        match self {
            Half::Morning => 'm',
            Half::Evening => 'e',
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "m" => Some(Half::Morning),
            "e" => Some(Half::Evening),
            _ => None,
        }
    }
}

/// Identifies a report half across users, e.g. inside review buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportRef {
    pub author_id: i64,
    pub date: NaiveDate,
    pub half: Half,
}

/// One submitted half of a daily report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportHalf {
    pub data: String,
    pub submitted_at: DateTime<Utc>,
    overdue_seconds: Option<i64>,
    approved: bool,
    approved_by_system: bool,
    approved_by: Option<i64>,
}

/// Result of an approval attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Approval {
    Approved,
    AlreadyApproved,
}

impl ReportHalf {
    /// Create a half; overdue is frozen here and never recomputed
    pub fn new(
        data: String,
        submitted_at: DateTime<Utc>,
        overdue: Option<Duration>,
        approved_by_system: bool,
    ) -> Self {
        Self {
            data,
            submitted_at,
            overdue_seconds: overdue.map(|d| d.num_seconds().max(0)),
            approved: approved_by_system,
            approved_by_system,
            approved_by: None,
        }
    }

    /// Rebuild a half from persisted columns
    pub fn restore(
        data: String,
        submitted_at: DateTime<Utc>,
        overdue_seconds: Option<i64>,
        approved: bool,
        approved_by_system: bool,
        approved_by: Option<i64>,
    ) -> Self {
        Self { data, submitted_at, overdue_seconds, approved, approved_by_system, approved_by }
    }

    pub fn overdue(&self) -> Option<Duration> {
        self.overdue_seconds.map(Duration::seconds)
    }

    pub fn overdue_seconds(&self) -> Option<i64> {
        self.overdue_seconds
    }

    pub fn is_approved(&self) -> bool {
        self.approved
    }

    pub fn is_approved_by_system(&self) -> bool {
        self.approved_by_system
    }

    pub fn approved_by(&self) -> Option<i64> {
        self.approved_by
    }

    /// Approval only ever moves from false to true
    pub fn approve(&mut self, reviewer_id: i64) -> Approval {
        if self.approved {
            return Approval::AlreadyApproved;
        }
        self.approved = true;
        self.approved_by = Some(reviewer_id);
        Approval::Approved
    }
}

/// A user's report for one calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub user_id: i64,
    pub date: NaiveDate,
    pub morning: Option<ReportHalf>,
    pub evening: Option<ReportHalf>,
}

impl Report {
    pub fn new(user_id: i64, date: NaiveDate) -> Self {
        Self { user_id, date, morning: None, evening: None }
    }

    pub fn half(&self, half: Half) -> Option<&ReportHalf> {
        match half {
            Half::Morning => self.morning.as_ref(),
            Half::Evening => self.evening.as_ref(),
        }
    }

    pub fn half_mut(&mut self, half: Half) -> Option<&mut ReportHalf> {
        match half {
            Half::Morning => self.morning.as_mut(),
            Half::Evening => self.evening.as_mut(),
        }
    }

    pub fn has(&self, half: Half) -> bool {
        self.half(half).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.morning.is_none() && self.evening.is_none()
    }

    pub fn reference(&self, half: Half) -> ReportRef {
        ReportRef { author_id: self.user_id, date: self.date, half }
    }

    /// Add a half; an occupied slot or an evening without morning is refused
    pub fn insert_half(&mut self, half: Half, value: ReportHalf) -> Result<()> {
        if self.has(half) {
            return Err(ReportBuddyError::InvalidInput(format!(
                "{} report for {} already submitted",
                half.as_str(),
                self.date
            )));
        }
        if half == Half::Evening && !self.has(Half::Morning) {
            return Err(ReportBuddyError::InvalidInput(
                "Evening report requires a morning report".to_string()
            ));
        }
        match half {
            Half::Morning => self.morning = Some(value),
            Half::Evening => self.evening = Some(value),
        }
        Ok(())
    }

    /// Remove a half, as a rejection does
    pub fn remove_half(&mut self, half: Half) -> Option<ReportHalf> {
        match half {
            Half::Morning => self.morning.take(),
            Half::Evening => self.evening.take(),
        }
    }
}
