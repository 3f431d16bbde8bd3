use polars::prelude::*;

use crate::error::FleetError;
use crate::risk::MaintenanceIssue;
use crate::schema::{self, risk, summary};

const RANK: &str = "_issue_rank";

fn issue_rank(issue: Expr) -> Expr {
    when(issue.clone().eq(lit(MaintenanceIssue::Low.as_str())))
        .then(lit(0i32))
        .when(issue.eq(lit(MaintenanceIssue::Medium.as_str())))
        .then(lit(1i32))
        .otherwise(lit(2i32))
}

/// Share of risk rows per maintenance issue level.
///
/// Without `group_by` the shares are over the whole table. With it, shares
/// are computed within each value of that column (e.g. a bus attribute
/// joined onto the risk table). Output: [group_by,] maintenance_issue,
/// count, percentage; ordered by group then LOW, MEDIUM, HIGH.
pub fn summarize_maintenance_issues(
    risk_df: &DataFrame,
    group_by: Option<&str>,
) -> Result<DataFrame, FleetError> {
    schema::require_columns(risk_df, &[risk::MAINTENANCE_ISSUE])?;
    if let Some(group) = group_by {
        schema::require_columns(risk_df, &[group])?;
    }

    let mut keys: Vec<Expr> = Vec::new();
    if let Some(group) = group_by {
        keys.push(col(group));
    }
    keys.push(col(risk::MAINTENANCE_ISSUE));

    let total = match group_by {
        Some(group) => col(summary::COUNT).sum().over([col(group)]),
        None => col(summary::COUNT).sum(),
    };

    let mut order = keys.clone();
    order.pop();
    order.push(col(RANK));

    let mut output = keys.clone();
    output.push(col(summary::COUNT));
    output.push(col(summary::PERCENTAGE));

    let df = risk_df
        .clone()
        .lazy()
        .group_by(keys)
        .agg([col(risk::MAINTENANCE_ISSUE)
            .count()
            .cast(DataType::Int64)
            .alias(summary::COUNT)])
        .with_columns([
            (col(summary::COUNT).cast(DataType::Float64) / total.cast(DataType::Float64))
                .alias(summary::PERCENTAGE),
            issue_rank(col(risk::MAINTENANCE_ISSUE)).alias(RANK),
        ])
        .sort_by_exprs(order, SortMultipleOptions::default())
        .select(output)
        .collect()?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn risk_table() -> DataFrame {
        df!(
            risk::BUS_ID => [1i64, 1, 2, 2, 3],
            risk::COMPONENT_TYPE => ["engine", "brakes", "engine", "brakes", "engine"],
            risk::MAINTENANCE_ISSUE => ["HIGH", "LOW", "LOW", "MEDIUM", "LOW"],
        )
        .unwrap()
    }

    #[test]
    fn overall_shares() {
        let out = summarize_maintenance_issues(&risk_table(), None).unwrap();
        assert_eq!(out.height(), 3);
        let issues: Vec<&str> = out
            .column(risk::MAINTENANCE_ISSUE)
            .unwrap()
            .str()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(issues, vec!["LOW", "MEDIUM", "HIGH"]);

        let counts = out.column(summary::COUNT).unwrap().i64().unwrap();
        assert_eq!(counts.get(0), Some(3));
        let shares = out.column(summary::PERCENTAGE).unwrap().f64().unwrap();
        assert!((shares.get(0).unwrap() - 0.6).abs() < 1e-12);
        let total: f64 = shares.into_no_null_iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn shares_within_group() {
        let out =
            summarize_maintenance_issues(&risk_table(), Some(risk::COMPONENT_TYPE)).unwrap();
        // brakes: LOW, MEDIUM; engine: LOW, HIGH
        assert_eq!(out.height(), 4);
        let groups: Vec<&str> = out
            .column(risk::COMPONENT_TYPE)
            .unwrap()
            .str()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(groups, vec!["brakes", "brakes", "engine", "engine"]);

        let shares = out.column(summary::PERCENTAGE).unwrap().f64().unwrap();
        assert!((shares.get(0).unwrap() - 0.5).abs() < 1e-12);
        assert!((shares.get(2).unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert!((shares.get(3).unwrap() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn unknown_group_column() {
        let err = summarize_maintenance_issues(&risk_table(), Some("region")).unwrap_err();
        assert!(matches!(err, FleetError::MissingColumn(c) if c == "region"));
    }
}
