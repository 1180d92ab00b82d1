//! スモークテスト
//!
//! 1本の接続でテーブル作成・挿入・検索を行う。

use lbcheck_common::{HarnessError, HarnessResult};
use sqlx::postgres::PgConnection;
use sqlx::Row;
use tracing::info;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS employee (id int, name varchar)";
const INSERT_ROW: &str = "INSERT INTO employee VALUES (1, 'C. Bose')";
const SELECT_NAME: &str = "SELECT name FROM employee WHERE id = 1";

/// スモーククエリを実行し、取得した名前を返す
pub async fn run_smoke_queries(connection: &mut PgConnection) -> HarnessResult<Vec<String>> {
    sqlx::query(CREATE_TABLE)
        .execute(&mut *connection)
        .await
        .map_err(database_error)?;

    sqlx::query(INSERT_ROW)
        .execute(&mut *connection)
        .await
        .map_err(database_error)?;

    let rows = sqlx::query(SELECT_NAME)
        .fetch_all(&mut *connection)
        .await
        .map_err(database_error)?;

    let names = rows
        .iter()
        .map(|row| row.try_get::<String, _>("name"))
        .collect::<Result<Vec<_>, _>>()
        .map_err(database_error)?;

    for name in &names {
        info!("name: {}", name);
    }
    Ok(names)
}

fn database_error(err: sqlx::Error) -> HarnessError {
    HarnessError::Database(err.to_string())
}
