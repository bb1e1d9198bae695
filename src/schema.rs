use std::fmt;
use std::str::FromStr;

use crate::error::HrError;

/// Warehouse schema the tables live in unless configured otherwise.
pub const DEFAULT_DB_SCHEMA: &str = "hr_data";

pub const MAX_TEXT_LEN: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Text,
    Timestamp,
}

impl ColumnType {
    pub fn sql_name(self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Text => "VARCHAR",
            ColumnType::Timestamp => "TIMESTAMPTZ",
        }
    }
}

#[derive(Debug)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub required: bool,
    pub max_len: Option<usize>,
    pub primary_key: bool,
    /// Omitted values are filled from the server clock.
    pub server_default: bool,
    pub references: Option<&'static str>,
    pub description: &'static str,
}

#[derive(Debug)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: &'static [ColumnSpec],
}

impl TableSchema {
    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    pub fn primary_key(&self) -> &'static ColumnSpec {
        self.columns
            .iter()
            .find(|c| c.primary_key)
            .unwrap_or(&self.columns[0])
    }
}

const fn id_column(description: &'static str) -> ColumnSpec {
    ColumnSpec {
        name: "id",
        column_type: ColumnType::Integer,
        required: true,
        max_len: None,
        primary_key: true,
        server_default: false,
        references: None,
        description,
    }
}

const fn text_column(name: &'static str, description: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        column_type: ColumnType::Text,
        required: true,
        max_len: Some(MAX_TEXT_LEN),
        primary_key: false,
        server_default: false,
        references: None,
        description,
    }
}

const fn reference_column(
    name: &'static str,
    references: &'static str,
    description: &'static str,
) -> ColumnSpec {
    ColumnSpec {
        name,
        column_type: ColumnType::Integer,
        required: false,
        max_len: None,
        primary_key: false,
        server_default: false,
        references: Some(references),
        description,
    }
}

pub static DEPARTMENTS: TableSchema = TableSchema {
    name: "departments",
    columns: &[
        id_column("Department ID"),
        text_column("department", "Department name"),
    ],
};

pub static JOBS: TableSchema = TableSchema {
    name: "jobs",
    columns: &[id_column("Job ID"), text_column("job", "Job title")],
};

pub static HIRED_EMPLOYEES: TableSchema = TableSchema {
    name: "hired_employees",
    columns: &[
        id_column("Employee ID"),
        text_column("name", "Employee name"),
        ColumnSpec {
            name: "datetime",
            column_type: ColumnType::Timestamp,
            required: false,
            max_len: None,
            primary_key: false,
            server_default: true,
            references: None,
            description: "Hire date and time",
        },
        reference_column("department_id", "departments.id", "Hiring department"),
        reference_column("job_id", "jobs.id", "Job hired for"),
    ],
};

/// One of the managed tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Departments,
    Jobs,
    HiredEmployees,
}

impl Table {
    pub const ALL: [Table; 3] = [Table::Departments, Table::Jobs, Table::HiredEmployees];

    pub fn schema(self) -> &'static TableSchema {
        match self {
            Table::Departments => &DEPARTMENTS,
            Table::Jobs => &JOBS,
            Table::HiredEmployees => &HIRED_EMPLOYEES,
        }
    }

    pub fn name(self) -> &'static str {
        self.schema().name
    }

    /// `<db_schema>.<table>` as it appears in generated statements.
    pub fn qualified(self, db_schema: &str) -> String {
        format!("{}.{}", db_schema, self.name())
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Table {
    type Err = HrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Table::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| HrError::not_found(format!("Invalid table name: {s}")))
    }
}

/// Plain-text description of every table, for question answering.
pub fn summary(db_schema: &str) -> String {
    let mut out = String::from("Database Schema:\n");
    for (i, table) in Table::ALL.into_iter().enumerate() {
        out.push_str(&format!("\n{}. {}\n", i + 1, table.qualified(db_schema)));
        for col in table.schema().columns {
            let mut ty = col.column_type.sql_name().to_string();
            if let Some(max) = col.max_len {
                ty.push_str(&format!("({max})"));
            }
            if col.primary_key {
                ty.push_str(", PRIMARY KEY");
            }
            let mut line = format!("   - {} ({}): {}", col.name, ty, col.description);
            if let Some(target) = col.references {
                line.push_str(&format!(", references {target}"));
            }
            out.push_str(&line);
            out.push('\n');
        }
    }
    out
}
