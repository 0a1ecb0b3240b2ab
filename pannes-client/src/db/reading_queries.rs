use sqlx::PgPool;

use crate::domain::RawReading;
use crate::error::{check_table_name, ClientError};

/// Build the full-snapshot query for `table`, newest rows first.
///
/// Columns are cast to the textual/float8 shapes `RawReading` decodes, so
/// `timestamp`, `timestamptz`, `numeric` and `real` columns all load.
pub fn snapshot_sql(table: &str) -> Result<String, ClientError> {
    let table = check_table_name(table)?;

    Ok(format!(
        r#"
        SELECT
            id::int8                AS id,
            "date"::text            AS "date",
            poste::text             AS poste,
            status::text            AS status,
            tension::float8         AS tension,
            courant::float8         AS courant,
            temperature::float8     AS temperature,
            frequence::float8       AS frequence,
            type_panne::text        AS type_panne
        FROM {table}
        ORDER BY "date" DESC
        "#
    ))
}

/// Fetch every reading of `table` over the Postgres wire protocol.
pub async fn fetch_all_readings(pool: &PgPool, table: &str) -> Result<Vec<RawReading>, ClientError> {
    let sql = snapshot_sql(table)?;

    let rows = sqlx::query_as::<_, RawReading>(&sql)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_sql_orders_by_date_descending() {
        let sql = snapshot_sql("pannes").unwrap();
        assert!(sql.contains("FROM pannes"));
        assert!(sql.contains(r#"ORDER BY "date" DESC"#));
        assert!(sql.contains("type_panne::text"));
    }

    #[test]
    fn snapshot_sql_refuses_bad_table_names() {
        assert!(matches!(
            snapshot_sql("pannes where 1=1"),
            Err(ClientError::InvalidTable(_))
        ));
    }
}
