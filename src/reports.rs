use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use crate::backend::QueryService;
use crate::error::HrError;
use crate::executor::{ResultSet, StatementExecutor};

pub const YEAR_RANGE: RangeInclusive<i32> = 2020..=2030;
pub const DEFAULT_YEAR: i32 = 2021;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    /// Hires per department and job, split by quarter.
    QuarterlyHiring,
    /// Departments that hired more than the mean across departments.
    DepartmentsAboveAverage,
}

impl Report {
    pub const ALL: [Report; 2] = [Report::QuarterlyHiring, Report::DepartmentsAboveAverage];

    pub fn name(self) -> &'static str {
        match self {
            Report::QuarterlyHiring => "quarterly_hiring_report",
            Report::DepartmentsAboveAverage => "departments_above_avg_hiring",
        }
    }

    /// SQL text for `year` in `db_schema`. `year` must already be in range.
    pub fn sql(self, db_schema: &str, year: i32) -> String {
        match self {
            Report::QuarterlyHiring => format!(
                "SELECT d.department, j.job, \
                 SUM(CASE WHEN EXTRACT(QUARTER FROM e.datetime) = 1 THEN 1 ELSE 0 END) AS q1, \
                 SUM(CASE WHEN EXTRACT(QUARTER FROM e.datetime) = 2 THEN 1 ELSE 0 END) AS q2, \
                 SUM(CASE WHEN EXTRACT(QUARTER FROM e.datetime) = 3 THEN 1 ELSE 0 END) AS q3, \
                 SUM(CASE WHEN EXTRACT(QUARTER FROM e.datetime) = 4 THEN 1 ELSE 0 END) AS q4 \
                 FROM {db_schema}.hired_employees e \
                 JOIN {db_schema}.departments d ON e.department_id = d.id \
                 JOIN {db_schema}.jobs j ON e.job_id = j.id \
                 WHERE EXTRACT(YEAR FROM e.datetime) = {year} \
                 GROUP BY d.department, j.job \
                 ORDER BY d.department, j.job"
            ),
            Report::DepartmentsAboveAverage => format!(
                "WITH hires AS ( \
                 SELECT d.id AS department_id, d.department AS department_name, \
                 COUNT(DISTINCT e.id) AS hired, \
                 AVG(COUNT(DISTINCT e.id)) OVER () AS avg_hired \
                 FROM {db_schema}.hired_employees e \
                 JOIN {db_schema}.departments d ON e.department_id = d.id \
                 WHERE EXTRACT(YEAR FROM e.datetime) = {year} AND d.department IS NOT NULL \
                 GROUP BY d.id, d.department) \
                 SELECT department_id, department_name, hired, ROUND(avg_hired, 2) AS avg_hired \
                 FROM hires \
                 WHERE hired > avg_hired \
                 ORDER BY hired DESC"
            ),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Report {
    type Err = HrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Report::ALL
            .into_iter()
            .find(|r| r.name() == s)
            .ok_or_else(|| HrError::not_found(format!("Unknown report: {s}")))
    }
}

/// Parse and range-check a year parameter.
pub fn parse_year(raw: &str) -> Result<i32, HrError> {
    let year = raw
        .trim()
        .parse::<i32>()
        .map_err(|_| HrError::invalid(format!("Invalid year parameter: {raw}")))?;
    check_year(year)
}

pub fn check_year(year: i32) -> Result<i32, HrError> {
    if !YEAR_RANGE.contains(&year) {
        return Err(HrError::invalid(format!(
            "Invalid year parameter: year must be between {} and {}, got {}",
            YEAR_RANGE.start(),
            YEAR_RANGE.end(),
            year
        )));
    }
    Ok(year)
}

/// Run the named report. Name and year are checked before anything is submitted.
pub async fn run_report<S: QueryService + Sync>(
    executor: &StatementExecutor<S>,
    db_schema: &str,
    name: &str,
    year: i32,
) -> Result<ResultSet, HrError> {
    let report = name.parse::<Report>()?;
    let year = check_year(year)?;
    tracing::debug!(report = %report, year, "running report");
    executor.execute(&report.sql(db_schema, year)).await
}
