//! Submission windows and overdue policy
//!
//! A day has two half-open submission windows, `[start, end)`, in the schedule
//! timezone. Which half a submission fills, and whether it is late, is decided
//! here from the clock and the user's report for the day. Nothing in this module
//! performs I/O.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Timelike};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::config::{ScheduleConfig, WindowConfig};
use crate::models::{Half, Report};
use crate::utils::errors::{ReportBuddyError, Result};

/// What happens to an evening-window submission when the morning half is missing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EveningGate {
    /// Rejected on the analyzed path; the author has to force-send the morning report
    RequireMorning,
    /// The submission fills the morning half late and system-approved
    LateMorningFirst,
}

/// How a report reached the submission step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPath {
    /// Scored by the analyzer and confirmed by the author
    Analyzed,
    /// Sent without scoring, accepted late outside the windows
    Forced,
}

/// Half-open wall-clock interval `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    start: NaiveTime,
    end: NaiveTime,
}

impl Window {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self> {
        if start >= end {
            return Err(ReportBuddyError::Config(format!(
                "Window start {} must be before its end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    fn from_config(config: &WindowConfig) -> Result<Self> {
        Self::new(parse_time(&config.start)?, parse_time(&config.end)?)
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        self.start <= time && time < self.end
    }
}

fn parse_time(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| {
            ReportBuddyError::Config(format!("Invalid window time '{}', expected HH:MM", value))
        })
}

/// The outcome of a successful submission check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionPlan {
    pub half: Half,
    pub overdue: Option<Duration>,
    pub approved_by_system: bool,
}

/// Why a submission cannot be accepted right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionRejection {
    /// Outside both windows on the analyzed path
    OutsideWindow,
    /// Before today's morning window opened; nothing has passed yet
    NotOpenYet,
    /// Morning half exists and the evening window has not passed yet
    WaitForEvening,
    /// Evening window without a morning half under [`EveningGate::RequireMorning`]
    MorningRequired,
    AlreadySubmitted(Half),
}

/// Duration by which `now` exceeds `window_end`; absent when not late
pub fn overdue<Z: TimeZone>(now: &DateTime<Z>, window_end: &DateTime<Z>) -> Option<Duration> {
    if now <= window_end {
        None
    } else {
        Some(now.clone().signed_duration_since(window_end.clone()))
    }
}

/// Submission window configuration and the decisions derived from it
#[derive(Debug, Clone, PartialEq)]
pub struct WindowPolicy {
    timezone: Tz,
    morning: Window,
    evening: Window,
    evening_gate: EveningGate,
}

impl WindowPolicy {
    pub fn new(
        timezone: Tz,
        morning: Window,
        evening: Window,
        evening_gate: EveningGate,
    ) -> Result<Self> {
        if morning.end > evening.start {
            return Err(ReportBuddyError::Config(
                "Morning window must end before the evening window starts".to_string()
            ));
        }
        Ok(Self { timezone, morning, evening, evening_gate })
    }

    pub fn from_config(config: &ScheduleConfig) -> Result<Self> {
        let timezone: Tz = config
            .timezone
            .parse()
            .map_err(|_| {
                ReportBuddyError::Config(format!("Invalid timezone: {}", config.timezone))
            })?;

        Self::new(
            timezone,
            Window::from_config(&config.morning)?,
            Window::from_config(&config.evening)?,
            config.evening_gate,
        )
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn window(&self, half: Half) -> Window {
        match half {
            Half::Morning => self.morning,
            Half::Evening => self.evening,
        }
    }

    /// Calendar day a submission at `now` belongs to
    pub fn business_date(&self, now: &DateTime<Tz>) -> NaiveDate {
        now.with_timezone(&self.timezone).date_naive()
    }

    fn local_time(&self, now: &DateTime<Tz>) -> NaiveTime {
        let local = now.with_timezone(&self.timezone);
        // Seconds granularity; sub-second precision never decides a window.
        local.time().with_nanosecond(0).unwrap_or_else(|| local.time())
    }

    pub fn is_morning_window(&self, now: &DateTime<Tz>) -> bool {
        self.morning.contains(self.local_time(now))
    }

    pub fn is_evening_window(&self, now: &DateTime<Tz>) -> bool {
        self.evening.contains(self.local_time(now))
    }

    pub fn is_working_period(&self, now: &DateTime<Tz>) -> bool {
        self.is_morning_window(now) || self.is_evening_window(now)
    }

    /// Absolute end of `half`'s window on `date`
    pub fn window_end(&self, half: Half, date: NaiveDate) -> DateTime<Tz> {
        let naive = date.and_time(self.window(half).end);
        self.timezone
            .from_local_datetime(&naive)
            .earliest()
            .unwrap_or_else(|| self.timezone.from_utc_datetime(&naive))
    }

    /// Decide which half a submission at `now` creates, given today's report
    pub fn plan_submission(
        &self,
        report: Option<&Report>,
        now: &DateTime<Tz>,
        path: SubmissionPath,
    ) -> std::result::Result<SubmissionPlan, SubmissionRejection> {
        let has_morning = report.map_or(false, |r| r.has(Half::Morning));
        let has_evening = report.map_or(false, |r| r.has(Half::Evening));
        let time = self.local_time(now);

        if has_morning && has_evening {
            return Err(SubmissionRejection::AlreadySubmitted(Half::Evening));
        }

        if self.morning.contains(time) {
            return if has_morning {
                Err(SubmissionRejection::AlreadySubmitted(Half::Morning))
            } else {
                Ok(self.on_time(Half::Morning))
            };
        }

        if self.evening.contains(time) {
            if has_morning {
                return Ok(self.on_time(Half::Evening));
            }
            return match (path, self.evening_gate) {
                (SubmissionPath::Analyzed, EveningGate::RequireMorning) => {
                    Err(SubmissionRejection::MorningRequired)
                }
                _ => Ok(self.late(Half::Morning, now)),
            };
        }

        if path == SubmissionPath::Analyzed {
            return Err(SubmissionRejection::OutsideWindow);
        }

        if time < self.morning.start {
            Err(SubmissionRejection::NotOpenYet)
        } else if !has_morning {
            Ok(self.late(Half::Morning, now))
        } else if time >= self.evening.end {
            Ok(self.late(Half::Evening, now))
        } else {
            Err(SubmissionRejection::WaitForEvening)
        }
    }

    fn on_time(&self, half: Half) -> SubmissionPlan {
        SubmissionPlan { half, overdue: None, approved_by_system: false }
    }

    fn late(&self, half: Half, now: &DateTime<Tz>) -> SubmissionPlan {
        let end = self.window_end(half, self.business_date(now));
        SubmissionPlan {
            half,
            overdue: overdue(now, &end),
            approved_by_system: true,
        }
    }
}
