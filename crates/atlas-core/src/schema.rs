//! Table layout for the `countries` table.

use serde::{Deserialize, Serialize};

/// Name of the table the loader replaces and the dashboard reads.
pub const COUNTRIES_TABLE: &str = "countries";

/// Scratch table the loader fills before swapping it in.
pub const STAGING_TABLE: &str = "countries_staging";

/// PostgreSQL column types used by the countries table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SqlType {
    /// Unlimited text
    Text,
    /// 64-bit integer
    BigInt,
    /// 64-bit floating point
    DoublePrecision,
}

impl SqlType {
    /// Generate the SQL type declaration.
    pub fn to_sql(&self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::BigInt => "BIGINT",
            SqlType::DoublePrecision => "DOUBLE PRECISION",
        }
    }
}

/// Definition of a table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name in SQL.
    pub name: &'static str,

    /// SQL type.
    pub sql_type: SqlType,

    /// Whether the column is nullable.
    pub nullable: bool,
}

impl ColumnDef {
    const fn new(name: &'static str, sql_type: SqlType, nullable: bool) -> Self {
        Self {
            name,
            sql_type,
            nullable,
        }
    }

    /// Generate SQL column definition.
    pub fn to_sql_column(&self) -> String {
        if self.nullable {
            format!("{} {}", self.name, self.sql_type.to_sql())
        } else {
            format!("{} {} NOT NULL", self.name, self.sql_type.to_sql())
        }
    }
}

/// Columns of the countries table, in insert order.
pub const COUNTRY_COLUMNS: [ColumnDef; 8] = [
    ColumnDef::new("country", SqlType::Text, false),
    ColumnDef::new("official_name", SqlType::Text, true),
    ColumnDef::new("capital", SqlType::Text, false),
    ColumnDef::new("region", SqlType::Text, true),
    ColumnDef::new("subregion", SqlType::Text, true),
    ColumnDef::new("population", SqlType::BigInt, false),
    ColumnDef::new("area", SqlType::DoublePrecision, false),
    ColumnDef::new("flag_url", SqlType::Text, true),
];

/// Comma separated column list for SELECT and INSERT statements.
pub fn column_list() -> String {
    COUNTRY_COLUMNS
        .iter()
        .map(|c| c.name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// `CREATE TABLE` statement for a table with the countries layout.
pub fn create_table_sql(table: &str) -> String {
    let columns: Vec<String> = COUNTRY_COLUMNS.iter().map(|c| c.to_sql_column()).collect();
    format!(
        "CREATE TABLE {} (\n    {}\n)",
        table,
        columns.join(",\n    ")
    )
}
