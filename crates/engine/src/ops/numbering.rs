//! Order number allocation: `ORD{year}{sequence:06}` per organization and year.
//!
//! The counter row is advanced with a compare-and-swap `UPDATE` inside the
//! caller's transaction, so a number is only consumed if the order insert
//! commits. A lost race surfaces as `ConcurrencyConflict` and the whole
//! attempt is retried.

use sea_orm::{ActiveValue, ConnectionTrait, SqlErr, Statement, prelude::*};

use crate::{EngineError, ResultEngine, order_counters};

pub fn format_order_number(year: i32, sequence: i64) -> String {
    format!("ORD{year}{sequence:06}")
}

fn conflict(organization_id: i64, year: i32) -> EngineError {
    EngineError::ConcurrencyConflict(format!(
        "order counter {organization_id}/{year} moved concurrently"
    ))
}

/// Allocates the next order number for `organization_id` in `year`.
pub(crate) async fn next_order_number<C: ConnectionTrait>(
    db: &C,
    organization_id: i64,
    year: i32,
) -> ResultEngine<String> {
    let current = order_counters::Entity::find_by_id((organization_id, year))
        .one(db)
        .await?;

    let sequence = match current {
        None => {
            let counter = order_counters::ActiveModel {
                organization_id: ActiveValue::Set(organization_id),
                year: ActiveValue::Set(year),
                last_value: ActiveValue::Set(1),
            };
            counter.insert(db).await.map_err(|err| match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => conflict(organization_id, year),
                _ => EngineError::from(err),
            })?;
            1
        }
        Some(counter) => {
            let next = counter.last_value + 1;
            let stmt = Statement::from_sql_and_values(
                db.get_database_backend(),
                "UPDATE order_counters SET last_value = ? \
                 WHERE organization_id = ? AND year = ? AND last_value = ?",
                vec![
                    next.into(),
                    organization_id.into(),
                    year.into(),
                    counter.last_value.into(),
                ],
            );
            let result = db.execute(stmt).await?;
            if result.rows_affected() != 1 {
                return Err(conflict(organization_id, year));
            }
            next
        }
    };

    Ok(format_order_number(year, sequence))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_layout() {
        assert_eq!(format_order_number(2025, 7), "ORD2025000007");
        assert_eq!(format_order_number(2026, 123_456), "ORD2026123456");
        assert_eq!(format_order_number(2026, 1_234_567), "ORD20261234567");
    }

    #[test]
    fn numbers_sort_by_sequence_within_a_year() {
        let a = format_order_number(2025, 9);
        let b = format_order_number(2025, 10);
        assert!(a < b);
    }
}
