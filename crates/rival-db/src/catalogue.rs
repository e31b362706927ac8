//! Existence checks against the chart catalogue.
//!
//! Charts and songs are maintained outside this crate; play records only
//! reference them.

use rival_types::ChartIdx;
use sqlx::{PgExecutor, PgPool};

use crate::error::DbError;

/// Read-only view of the `chart` table.
pub struct CatalogueStore<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogueStore<'a> {
    /// Create a new catalogue store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fail with [`DbError::NotFound`] unless the chart exists.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] or [`DbError::Postgres`].
    pub async fn ensure_chart(&self, chart_idx: ChartIdx) -> Result<(), DbError> {
        match missing_charts(self.pool, &[chart_idx]).await?.first() {
            Some(missing) => Err(DbError::chart_not_found(missing)),
            None => Ok(()),
        }
    }
}

/// Return the subset of `charts` that do not exist, in ascending order.
///
/// Takes any executor so the import transaction can run it.
pub(crate) async fn missing_charts<'e, E>(
    executor: E,
    charts: &[ChartIdx],
) -> Result<Vec<ChartIdx>, DbError>
where
    E: PgExecutor<'e>,
{
    if charts.is_empty() {
        return Ok(Vec::new());
    }
    let wanted: Vec<i32> = charts.iter().map(|c| c.into_inner()).collect();
    let missing = sqlx::query_scalar::<_, i32>(
        r"SELECT wanted.idx
          FROM UNNEST($1::INTEGER[]) AS wanted(idx)
          LEFT JOIN chart ON chart.idx = wanted.idx
          WHERE chart.idx IS NULL
          ORDER BY wanted.idx",
    )
    .bind(&wanted)
    .fetch_all(executor)
    .await?;

    Ok(missing.into_iter().map(ChartIdx::new).collect())
}
