use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::filter::{Filter, OrderBy, matches_all};
use crate::{Result, Row, Store, StoreError, Table};

/// Outcome of [`Store::toggle`].
#[derive(Debug, Clone, PartialEq)]
pub enum Toggled {
    /// No row matched; the record was inserted.
    Inserted(Row),
    /// Matching rows existed and were removed.
    Removed(Vec<Row>),
}

impl Store {
    // -- Raw rows --

    /// Copies of all rows matching every filter. No filters returns the whole table.
    pub fn select(&self, table: &str, filters: &[Filter]) -> Result<Vec<Row>> {
        self.with_table(table, |t| {
            Ok(t.rows.iter().filter(|r| matches_all(filters, r)).cloned().collect())
        })
    }

    /// Copy of the whole table sorted by `order`; ties keep insertion order.
    pub fn select_ordered(&self, table: &str, order: &OrderBy) -> Result<Vec<Row>> {
        let mut rows = self.select(table, &[])?;
        order.sort(&mut rows);
        Ok(rows)
    }

    /// Store a record, assigning `id` and timestamp columns the caller left out.
    pub fn insert(&self, table: &str, record: Row) -> Result<Row> {
        let stored = self.with_table(table, |t| insert_row(t, record))?;
        debug!(table, id = ?stored.get("id"), "row inserted");
        Ok(stored)
    }

    /// Shallow-merge `patch` into every matching row. No match is an empty result.
    pub fn update(&self, table: &str, filters: &[Filter], patch: Row) -> Result<Vec<Row>> {
        self.with_table(table, |t| Ok(update_rows(t, filters, &patch)))
    }

    pub fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Row>> {
        self.with_table(table, |t| Ok(delete_rows(t, filters)))
    }

    /// Delete every row matching `filters`, or insert `record` when none does.
    /// Check and write happen under one lock, so concurrent togglers of the
    /// same key can never both insert.
    pub fn toggle(&self, table: &str, filters: &[Filter], record: Row) -> Result<Toggled> {
        self.with_table(table, |t| {
            let removed = delete_rows(t, filters);
            if removed.is_empty() {
                Ok(Toggled::Inserted(insert_row(t, record)?))
            } else {
                Ok(Toggled::Removed(removed))
            }
        })
    }

    /// Merge `patch` into the first row matching `filters`, or insert
    /// `filters ∪ patch` as a new row. Returns the resulting row.
    pub fn upsert(&self, table: &str, filters: &[Filter], patch: Row) -> Result<Row> {
        self.with_table(table, |t| {
            if let Some(row) = t.rows.iter_mut().find(|r| matches_all(filters, r)) {
                merge(row, &patch);
                return Ok(row.clone());
            }

            let mut record = patch;
            for f in filters {
                record.insert(f.column.clone(), f.value.clone());
            }
            insert_row(t, record)
        })
    }

    /// First row matching `filters`, or `record` freshly inserted when none
    /// does. The flag is `true` when the row was inserted.
    pub fn find_or_insert(&self, table: &str, filters: &[Filter], record: Row) -> Result<(Row, bool)> {
        self.with_table(table, |t| {
            if let Some(row) = t.rows.iter().find(|r| matches_all(filters, r)) {
                return Ok((row.clone(), false));
            }
            Ok((insert_row(t, record)?, true))
        })
    }

    // -- Typed helpers --

    pub fn select_as<T: DeserializeOwned>(&self, table: &str, filters: &[Filter]) -> Result<Vec<T>> {
        from_rows(self.select(table, filters)?)
    }

    pub fn select_ordered_as<T: DeserializeOwned>(&self, table: &str, order: &OrderBy) -> Result<Vec<T>> {
        from_rows(self.select_ordered(table, order)?)
    }

    pub fn insert_as<N, T>(&self, table: &str, record: &N) -> Result<T>
    where
        N: Serialize,
        T: DeserializeOwned,
    {
        let stored = self.insert(table, to_row(table, record)?)?;
        from_row(stored)
    }

    pub fn update_as<P, T>(&self, table: &str, filters: &[Filter], patch: &P) -> Result<Vec<T>>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        from_rows(self.update(table, filters, to_row(table, patch)?)?)
    }

    pub fn upsert_as<P, T>(&self, table: &str, filters: &[Filter], patch: &P) -> Result<T>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        from_row(self.upsert(table, filters, to_row(table, patch)?)?)
    }
}

/// Serialize a model into a row. Anything that is not a JSON object is rejected.
pub fn to_row<S: Serialize>(table: &str, value: &S) -> Result<Row> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::InvalidRecord(table.to_string())),
    }
}

pub fn from_row<T: DeserializeOwned>(row: Row) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(row))?)
}

fn from_rows<T: DeserializeOwned>(rows: Vec<Row>) -> Result<Vec<T>> {
    rows.into_iter().map(from_row).collect()
}

pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn is_absent(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn insert_row(t: &mut Table, mut record: Row) -> Result<Row> {
    if is_absent(record.get("id")) {
        let id = next_free_id(t)?;
        record.insert("id".to_string(), Value::String(id));
    } else if let Some(n) = numeric_id(record.get("id")) {
        // Explicit numeric ids push the counter past themselves so later
        // auto-assigned ids never collide with them.
        t.next_id = t.next_id.max(n.saturating_add(1));
    }

    let now = now_timestamp();
    for column in t.stamped {
        if is_absent(record.get(*column)) {
            record.insert(column.to_string(), Value::String(now.clone()));
        }
    }

    t.rows.push(record.clone());
    Ok(record)
}

/// The counter stops at `u64::MAX` instead of wrapping; an exhausted table
/// only accepts rows with explicit ids.
fn next_free_id(t: &mut Table) -> Result<String> {
    loop {
        let candidate = t.next_id;
        t.next_id = candidate.checked_add(1).ok_or(StoreError::IdsExhausted)?;
        let candidate = candidate.to_string();
        let taken = t
            .rows
            .iter()
            .any(|r| r.get("id").and_then(Value::as_str) == Some(candidate.as_str()));
        if !taken {
            return Ok(candidate);
        }
    }
}

fn numeric_id(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

fn merge(row: &mut Row, patch: &Row) {
    for (k, v) in patch {
        row.insert(k.clone(), v.clone());
    }
}

fn update_rows(t: &mut Table, filters: &[Filter], patch: &Row) -> Vec<Row> {
    let mut updated = Vec::new();
    for row in t.rows.iter_mut().filter(|r| matches_all(filters, r)) {
        merge(row, patch);
        updated.push(row.clone());
    }
    updated
}

fn delete_rows(t: &mut Table, filters: &[Filter]) -> Vec<Row> {
    let (removed, kept): (Vec<Row>, Vec<Row>) =
        std::mem::take(&mut t.rows).into_iter().partition(|r| matches_all(filters, r));
    t.rows = kept;
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn unknown_table_is_an_error() {
        let store = Store::new();
        let err = store.select("guestbook", &[]).unwrap_err();
        assert!(matches!(err, StoreError::UnknownTable(ref name) if name == "guestbook"));
        assert!(store.insert("guestbook", Row::new()).is_err());
        assert!(store.delete("guestbook", &[]).is_err());
    }

    #[test]
    fn ad_hoc_tables_only_stamp_created_at() {
        let store = Store::with_tables(["notes"]);
        assert_eq!(store.table_names(), vec!["notes"]);

        let note = store.insert("notes", row(json!({ "body": "hi" }))).unwrap();
        assert!(note["created_at"].is_string());
        assert!(note.get("updated_at").is_none());
        assert!(store.select(tables::MESSAGES, &[]).is_err());
    }

    #[test]
    fn insert_assigns_ids_and_timestamps() {
        let store = Store::new();
        let first = store.insert(tables::MESSAGES, row(json!({ "content": "a" }))).unwrap();
        let second = store.insert(tables::MESSAGES, row(json!({ "content": "b" }))).unwrap();

        assert_eq!(first["id"], "1");
        assert_eq!(second["id"], "2");
        assert!(first["created_at"].is_string());
        assert!(first["updated_at"].is_string());

        let reaction = store.insert(tables::REACTIONS, row(json!({ "emoji": "like" }))).unwrap();
        assert_eq!(reaction["id"], "1");
        assert!(reaction.get("updated_at").is_none());
    }

    #[test]
    fn insert_keeps_caller_supplied_columns() {
        let store = Store::new();
        let stored = store
            .insert(
                tables::USERS,
                row(json!({ "id": "u-7", "created_at": "2025-01-01T12:00:00Z" })),
            )
            .unwrap();
        assert_eq!(stored["id"], "u-7");
        assert_eq!(stored["created_at"], "2025-01-01T12:00:00Z");
    }

    #[test]
    fn ids_are_never_reused_after_delete() {
        let store = Store::new();
        let mut seen = std::collections::HashSet::new();
        for i in 0..10 {
            let stored = store.insert(tables::REACTIONS, row(json!({ "n": i }))).unwrap();
            assert!(seen.insert(stored["id"].as_str().unwrap().to_string()));
            if i % 3 == 0 {
                store.delete(tables::REACTIONS, &[Filter::eq("n", i)]).unwrap();
            }
        }
        assert_eq!(seen.len(), 10);
    }

    #[test]
    fn explicit_numeric_ids_advance_the_counter() {
        let store = Store::new();
        store.insert(tables::USERS, row(json!({ "id": "5" }))).unwrap();
        let next = store.insert(tables::USERS, Row::new()).unwrap();
        assert_eq!(next["id"], "6");

        // Opaque ids leave the counter alone.
        store.insert(tables::REACTIONS, row(json!({ "id": "r-1" }))).unwrap();
        let auto = store.insert(tables::REACTIONS, Row::new()).unwrap();
        assert_eq!(auto["id"], "1");
    }

    #[test]
    fn exhausted_counter_is_an_error_not_a_wrap() {
        let store = Store::new();
        store
            .insert(tables::REACTIONS, row(json!({ "id": u64::MAX.to_string() })))
            .unwrap();

        let err = store.insert(tables::REACTIONS, Row::new()).unwrap_err();
        assert!(matches!(err, StoreError::IdsExhausted));

        // The table stays usable and still accepts explicit ids.
        assert_eq!(store.select(tables::REACTIONS, &[]).unwrap().len(), 1);
        store.insert(tables::REACTIONS, row(json!({ "id": "r-1" }))).unwrap();
        assert_eq!(store.select(tables::REACTIONS, &[]).unwrap().len(), 2);
    }

    #[test]
    fn select_returns_independent_copies() {
        let store = Store::new();
        store.insert(tables::USERS, row(json!({ "name": "Ann" }))).unwrap();

        let mut rows = store.select(tables::USERS, &[]).unwrap();
        rows[0].insert("name".into(), json!("Mallory"));

        let again = store.select(tables::USERS, &[]).unwrap();
        assert_eq!(again[0]["name"], "Ann");
    }

    #[test]
    fn filters_compose_with_and() {
        let store = Store::new();
        for (m, u, e) in [("1", "1", "like"), ("1", "2", "like"), ("1", "1", "love")] {
            store
                .insert(tables::REACTIONS, row(json!({ "message_id": m, "user_id": u, "emoji": e })))
                .unwrap();
        }
        let hits = store
            .select(
                tables::REACTIONS,
                &[Filter::eq("message_id", "1"), Filter::eq("user_id", "1"), Filter::eq("emoji", "like")],
            )
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(store.select(tables::REACTIONS, &[Filter::eq("user_id", "1")]).unwrap().len(), 2);
    }

    #[test]
    fn update_merges_and_reports_matches() {
        let store = Store::new();
        store.insert(tables::USERS, row(json!({ "name": "Ann", "banned": false }))).unwrap();

        let updated = store
            .update(tables::USERS, &[Filter::eq("id", "1")], row(json!({ "banned": true })))
            .unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0]["banned"], true);
        assert_eq!(updated[0]["name"], "Ann");

        let none = store
            .update(tables::USERS, &[Filter::eq("id", "404")], row(json!({ "banned": true })))
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn toggle_inserts_then_removes() {
        let store = Store::new();
        let key = [Filter::eq("message_id", "1"), Filter::eq("user_id", "3")];
        let record = row(json!({ "message_id": "1", "user_id": "3" }));

        assert!(matches!(store.toggle(tables::REACTIONS, &key, record.clone()).unwrap(), Toggled::Inserted(_)));
        assert!(matches!(store.toggle(tables::REACTIONS, &key, record).unwrap(), Toggled::Removed(ref r) if r.len() == 1));
        assert!(store.select(tables::REACTIONS, &key).unwrap().is_empty());
    }

    #[test]
    fn upsert_never_creates_a_second_row() {
        let store = Store::new();
        let key = [Filter::eq("user_id", "9")];

        let first = store.upsert(tables::USERS_META, &key, row(json!({ "theme": "dark" }))).unwrap();
        assert_eq!(first["user_id"], "9");
        let second = store.upsert(tables::USERS_META, &key, row(json!({ "language": "ru" }))).unwrap();
        assert_eq!(second["theme"], "dark");
        assert_eq!(second["language"], "ru");
        assert_eq!(store.select(tables::USERS_META, &key).unwrap().len(), 1);
    }

    #[test]
    fn find_or_insert_inserts_once() {
        let store = Store::new();
        let key = [Filter::eq("provider", "github"), Filter::eq("provider_id", "42")];
        let record = row(json!({ "provider": "github", "provider_id": "42", "name": "Octo" }));

        let (first, inserted) = store.find_or_insert(tables::USERS, &key, record.clone()).unwrap();
        assert!(inserted);
        let (second, inserted) = store.find_or_insert(tables::USERS, &key, record).unwrap();
        assert!(!inserted);
        assert_eq!(first["id"], second["id"]);
    }

    #[test]
    fn concurrent_toggles_leave_parity_consistent_state() {
        let store = std::sync::Arc::new(Store::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        let key = [Filter::eq("message_id", "1"), Filter::eq("emoji", "like")];
                        let record = row(json!({ "message_id": "1", "emoji": "like" }));
                        store.toggle(tables::REACTIONS, &key, record).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        // 200 toggles: an even count always returns to empty.
        assert!(store.select(tables::REACTIONS, &[]).unwrap().is_empty());
    }
}
