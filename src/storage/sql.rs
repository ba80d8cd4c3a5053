//! SQL text for the PostgreSQL store.
//!
//! Identifiers are spliced in only through [`Identifier::quoted`]; every
//! value travels as a bind parameter.

use crate::connection::Selection;
use crate::core::{DbError, ID_COLUMN, Identifier, Result, SqlType};

/// `$1` = database name, `$2` = table name.
pub const TABLE_EXISTS: &str = "SELECT EXISTS(SELECT 1 FROM information_schema.tables \
     WHERE table_catalog::text = $1 AND table_schema = 'public' AND table_name::text = $2)";

/// `$1` = database name, `$2` = table name.
pub const COLUMN_TYPES: &str = "SELECT column_name::text, data_type::text, is_nullable::text \
     FROM information_schema.columns \
     WHERE table_catalog::text = $1 AND table_schema = 'public' AND table_name::text = $2 \
     ORDER BY ordinal_position";

pub fn create_table(table: &Identifier, columns: &[(Identifier, SqlType)]) -> Result<String> {
    let mut definitions = vec![format!("{} SERIAL PRIMARY KEY", quoted_id())];

    for (name, data_type) in columns {
        if name.is_id() {
            return Err(DbError::InvalidIdentifier(format!(
                "'{}' is reserved for the surrogate key",
                ID_COLUMN
            )));
        }
        definitions.push(format!("{} {} NOT NULL", name.quoted(), data_type.ddl()?));
    }

    Ok(format!(
        "CREATE TABLE {} ({})",
        table.quoted(),
        definitions.join(", ")
    ))
}

pub fn drop_table(table: &Identifier) -> String {
    format!("DROP TABLE {}", table.quoted())
}

pub fn insert(table: &Identifier, columns: &[Identifier]) -> String {
    if columns.is_empty() {
        return format!("INSERT INTO {} DEFAULT VALUES", table.quoted());
    }

    let names: Vec<String> = columns.iter().map(Identifier::quoted).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("${}", i)).collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table.quoted(),
        names.join(", "),
        placeholders.join(", ")
    )
}

pub fn count(table: &Identifier) -> String {
    format!("SELECT COUNT(*) FROM {}", table.quoted())
}

/// `ById` binds the id as `$1`; `Range` binds limit and offset as `$1`, `$2`.
/// All three are BIGINT so ids past the INTEGER range still compare.
pub fn select(table: &Identifier, selection: Selection) -> String {
    let base = format!("SELECT * FROM {}", table.quoted());

    match selection {
        Selection::All => base,
        Selection::ById(_) => format!("{} WHERE {} = $1::int8", base, quoted_id()),
        Selection::Range { .. } => format!("{} LIMIT $1 OFFSET $2", base),
    }
}

fn quoted_id() -> String {
    postgres_protocol::escape::escape_identifier(ID_COLUMN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Identifier {
        Identifier::new(name).unwrap()
    }

    #[test]
    fn test_create_table() {
        let columns = vec![
            (ident("AT"), SqlType::Numeric),
            (ident("V"), SqlType::Numeric),
        ];

        let sql = create_table(&ident("powerplant"), &columns).unwrap();
        assert_eq!(
            sql,
            r#"CREATE TABLE "powerplant" ("id" SERIAL PRIMARY KEY, "at" NUMERIC NOT NULL, "v" NUMERIC NOT NULL)"#
        );
    }

    #[test]
    fn test_create_table_rejects_id_column() {
        let columns = vec![(ident("ID"), SqlType::Integer)];
        assert!(matches!(
            create_table(&ident("powerplant"), &columns),
            Err(DbError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_insert_uses_placeholders() {
        let sql = insert(&ident("powerplant"), &[ident("at"), ident("v"), ident("ap")]);
        assert_eq!(
            sql,
            r#"INSERT INTO "powerplant" ("at", "v", "ap") VALUES ($1, $2, $3)"#
        );
        assert_eq!(
            insert(&ident("powerplant"), &[]),
            r#"INSERT INTO "powerplant" DEFAULT VALUES"#
        );
    }

    #[test]
    fn test_select_variants() {
        let table = ident("powerplant");
        assert_eq!(select(&table, Selection::All), r#"SELECT * FROM "powerplant""#);
        assert_eq!(
            select(&table, Selection::ById(3)),
            r#"SELECT * FROM "powerplant" WHERE "id" = $1::int8"#
        );
        assert_eq!(
            select(&table, Selection::Range { limit: 2, offset: 1 }),
            r#"SELECT * FROM "powerplant" LIMIT $1 OFFSET $2"#
        );
    }

    #[test]
    fn test_count_and_drop() {
        let table = ident("powerplant");
        assert_eq!(count(&table), r#"SELECT COUNT(*) FROM "powerplant""#);
        assert_eq!(drop_table(&table), r#"DROP TABLE "powerplant""#);
    }
}
