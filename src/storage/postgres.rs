use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};

use crate::domain::{Rule, RuleId};

use super::traits::RuleStore;

/// PostgreSQL implementation of the RuleStore trait.
///
/// Conditions are stored as JSON text and handed to the evaluator as is,
/// so a malformed condition only affects its own rule. A row that does not
/// decode fails the whole query instead.
pub struct PostgresRuleStore {
    pool: PgPool,
}

/// One row of the `rules` table.
#[derive(Debug, Clone, FromRow)]
struct RuleRow {
    id: i64,
    name: String,
    description: Option<String>,
    tx_type: String,
    condition: String,
    points: i32,
    active: bool,
}

impl From<RuleRow> for Rule {
    fn from(row: RuleRow) -> Self {
        Rule {
            id: RuleId(row.id),
            name: row.name,
            description: row.description.unwrap_or_default(),
            tx_type: row.tx_type,
            condition: serde_json::Value::String(row.condition),
            points: row.points,
            active: row.active,
        }
    }
}

impl PostgresRuleStore {
    /// Create a new PostgresRuleStore with a connection pool.
    pub async fn connect(
        database_url: &str,
        min_connections: u32,
        max_connections: u32,
    ) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(min_connections)
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Run database migrations.
    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl RuleStore for PostgresRuleStore {
    async fn list_active_rules_for(&self, tx_types: &[String]) -> anyhow::Result<Vec<Rule>> {
        let rows: Vec<RuleRow> = sqlx::query_as(
            r#"
            SELECT id, name, description, tx_type, condition, points, active
            FROM rules
            WHERE active AND tx_type = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(tx_types)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Rule::from).collect())
    }

    fn describe(&self) -> String {
        "postgres".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Condition;

    fn row(description: Option<&str>, condition: &str) -> RuleRow {
        RuleRow {
            id: 7,
            name: "large pix".to_string(),
            description: description.map(str::to_string),
            tx_type: "PIX".to_string(),
            condition: condition.to_string(),
            points: 450,
            active: true,
        }
    }

    #[test]
    fn test_row_maps_to_rule() {
        let rule = Rule::from(row(
            Some("value above ten thousand"),
            r#"{"type":"value_range","min":"10000","max":"999999999"}"#,
        ));

        assert_eq!(rule.id, RuleId(7));
        assert_eq!(rule.description, "value above ten thousand");
        assert_eq!(rule.points, 450);
        assert!(matches!(
            Condition::parse(&rule.condition),
            Ok(Condition::ValueRange { .. })
        ));
    }

    #[test]
    fn test_null_description_becomes_empty() {
        let rule = Rule::from(row(None, r#"{"type":"ip_restrictive_list"}"#));
        assert_eq!(rule.description, "");
    }

    #[test]
    fn test_unreadable_condition_kept_for_evaluator() {
        let rule = Rule::from(row(None, "not json"));

        assert_eq!(rule.condition, serde_json::Value::String("not json".to_string()));
        assert!(Condition::parse(&rule.condition).is_err());
    }
}
