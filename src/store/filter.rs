//! Transfer filter to SQL
//!
//! Builds the WHERE clause for transfer listings. Every value is bound as a
//! parameter.

use sqlx::{Postgres, QueryBuilder};

use crate::domain::TransferFilter;

/// Append the WHERE clause for `filter` to `query`.
///
/// The `from`/`to` id filters are OR-ed into one parenthesised group; every
/// other condition is AND-ed to it.
pub fn push_transfer_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &TransferFilter) {
    let mut clause = Clause::default();

    match (&filter.from, &filter.to) {
        (Some(from), Some(to)) => {
            clause.next(query);
            query
                .push(r#"("from" = "#)
                .push_bind(from.clone())
                .push(r#" OR "to" = "#)
                .push_bind(to.clone())
                .push(")");
        }
        (Some(from), None) => {
            clause.next(query);
            query.push(r#""from" = "#).push_bind(from.clone());
        }
        (None, Some(to)) => {
            clause.next(query);
            query.push(r#""to" = "#).push_bind(to.clone());
        }
        (None, None) => {}
    }

    if let Some(currency) = filter.currency {
        clause.next(query);
        query.push("currency = ").push_bind(currency.code());
    }

    if let Some(since) = filter.since {
        clause.next(query);
        query.push("created_at >= ").push_bind(since);
    }

    if let Some(until) = filter.until {
        clause.next(query);
        query.push("created_at < ").push_bind(until);
    }
}

#[derive(Default)]
struct Clause {
    started: bool,
}

impl Clause {
    fn next(&mut self, query: &mut QueryBuilder<'_, Postgres>) {
        query.push(if self.started { " AND " } else { " WHERE " });
        self.started = true;
    }
}
