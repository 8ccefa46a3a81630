//! Report repository implementation

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgConnection, PgPool};

use crate::models::{Half, Report, ReportHalf};
use crate::utils::errors::Result;

#[derive(Debug, FromRow)]
struct HalfRow {
    half: Half,
    data: String,
    submitted_at: DateTime<Utc>,
    overdue_seconds: Option<i64>,
    approved: bool,
    approved_by_system: bool,
    approved_by: Option<i64>,
}

#[derive(Clone)]
#[derive(Debug)]
pub struct ReportRepository {
    pool: PgPool,
}

impl ReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the report of a user for one day
    pub async fn find(&self, user_id: i64, date: NaiveDate) -> Result<Option<Report>> {
        let exists: Option<(i64,)> = sqlx::query_as(
            "SELECT user_id FROM reports WHERE user_id = $1 AND report_date = $2"
        )
        .bind(user_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        if exists.is_none() {
            return Ok(None);
        }

        let rows = sqlx::query_as::<_, HalfRow>(
            r#"
            SELECT half, data, submitted_at, overdue_seconds,
                   approved, approved_by_system, approved_by
            FROM report_halves
            WHERE user_id = $1 AND report_date = $2
            "#
        )
        .bind(user_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        let mut report = Report::new(user_id, date);
        for row in rows {
            let half = ReportHalf::restore(
                row.data,
                row.submitted_at,
                row.overdue_seconds,
                row.approved,
                row.approved_by_system,
                row.approved_by,
            );
            match row.half {
                Half::Morning => report.morning = Some(half),
                Half::Evening => report.evening = Some(half),
            }
        }

        Ok(Some(report))
    }

    /// Write a report and its halves; absent halves are deleted
    ///
    /// Overdue and submission time are never overwritten, and approval can only
    /// be switched on.
    pub async fn upsert(conn: &mut PgConnection, report: &Report) -> Result<()> {
        sqlx::query(
            "INSERT INTO reports (user_id, report_date) VALUES ($1, $2) ON CONFLICT DO NOTHING"
        )
        .bind(report.user_id)
        .bind(report.date)
        .execute(&mut *conn)
        .await?;

        for half in [Half::Morning, Half::Evening] {
            match report.half(half) {
                Some(value) => {
                    sqlx::query(
                        r#"
                        INSERT INTO report_halves (
                            user_id, report_date, half, data, submitted_at, overdue_seconds,
                            approved, approved_by_system, approved_by
                        )
                        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                        ON CONFLICT (user_id, report_date, half) DO UPDATE
                        SET approved = report_halves.approved OR EXCLUDED.approved,
                            approved_by = COALESCE(report_halves.approved_by, EXCLUDED.approved_by)
                        "#
                    )
                    .bind(report.user_id)
                    .bind(report.date)
                    .bind(half)
                    .bind(&value.data)
                    .bind(value.submitted_at)
                    .bind(value.overdue_seconds())
                    .bind(value.is_approved())
                    .bind(value.is_approved_by_system())
                    .bind(value.approved_by())
                    .execute(&mut *conn)
                    .await?;
                }
                None => {
                    sqlx::query(
                        "DELETE FROM report_halves \
                         WHERE user_id = $1 AND report_date = $2 AND half = $3",
                    )
                    .bind(report.user_id)
                    .bind(report.date)
                    .bind(half)
                    .execute(&mut *conn)
                    .await?;
                }
            }
        }

        Ok(())
    }

    /// Delete a report together with its halves
    pub async fn delete(conn: &mut PgConnection, user_id: i64, date: NaiveDate) -> Result<()> {
        sqlx::query("DELETE FROM reports WHERE user_id = $1 AND report_date = $2")
            .bind(user_id)
            .bind(date)
            .execute(conn)
            .await?;

        Ok(())
    }
}
