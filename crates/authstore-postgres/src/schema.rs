//! Users table layout and the SQL issued against it.
//!
//! Column names are the record's field names in PascalCase and are always
//! double-quoted, since PostgreSQL folds unquoted identifiers to lower case.

use authstore_storage::UserField;

/// PostgreSQL truncates identifiers longer than this many bytes.
const MAX_IDENTIFIER_LEN: usize = 63;

/// Suffixes of the token index names derived from the table name.
const INDEX_SUFFIXES: [&str; 2] = ["_confirm_token_idx", "_recover_token_idx"];

/// Longest table name whose derived index names still fit in an identifier.
pub const MAX_TABLE_NAME_LEN: usize = MAX_IDENTIFIER_LEN - INDEX_SUFFIXES[0].len();

/// Returns `true` if `name` is usable as an unquoted-safe table identifier.
///
/// Names are capped at [`MAX_TABLE_NAME_LEN`] so the index names built from
/// them are not truncated into each other.
#[must_use]
pub fn is_valid_table_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    name.len() <= MAX_TABLE_NAME_LEN && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Statements that create the users table and its secondary indexes.
///
/// All of them are idempotent.
#[must_use]
pub fn create_table_statements(table: &str) -> Vec<String> {
    vec![
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS "{table}" (
                "ID" BIGINT GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
                "Key" TEXT NOT NULL UNIQUE,
                "Name" TEXT,
                "Email" TEXT,
                "Password" TEXT,
                "Oauth2Uid" TEXT,
                "Oauth2Provider" TEXT,
                "Oauth2Token" TEXT,
                "Oauth2Refresh" TEXT,
                "Oauth2Expiry" TIMESTAMPTZ,
                "ConfirmToken" TEXT,
                "Confirmed" BOOLEAN NOT NULL DEFAULT FALSE,
                "AttemptNumber" BIGINT NOT NULL DEFAULT 0,
                "AttemptTime" TIMESTAMPTZ,
                "Locked" TIMESTAMPTZ,
                "RecoverToken" TEXT,
                "RecoverTokenExpiry" TIMESTAMPTZ
            )
            "#
        ),
        format!(
            r#"CREATE INDEX IF NOT EXISTS "{table}{}" ON "{table}" ("ConfirmToken")"#,
            INDEX_SUFFIXES[0]
        ),
        format!(
            r#"CREATE INDEX IF NOT EXISTS "{table}{}" ON "{table}" ("RecoverToken")"#,
            INDEX_SUFFIXES[1]
        ),
    ]
}

/// Columns written on insert/upsert, in bind order. `ID` is table-assigned.
pub(crate) fn writable_fields() -> impl Iterator<Item = UserField> {
    UserField::ALL
        .into_iter()
        .filter(|field| *field != UserField::Id)
}

fn quoted(field: UserField) -> String {
    format!(r#""{}""#, field.column())
}

/// Prepared SQL text for one users table.
#[derive(Debug, Clone)]
pub(crate) struct Statements {
    pub(crate) insert: String,
    pub(crate) upsert: String,
    pub(crate) select_by_key: String,
    pub(crate) select_by_confirm_token: String,
    pub(crate) select_by_recover_token: String,
}

impl Statements {
    pub(crate) fn new(table: &str) -> Self {
        let columns: Vec<String> = writable_fields().map(quoted).collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("${i}")).collect();

        let insert = format!(
            r#"INSERT INTO "{table}" ({}) VALUES ({})"#,
            columns.join(", "),
            placeholders.join(", ")
        );

        let updates: Vec<String> = writable_fields()
            .filter(|field| *field != UserField::Key)
            .map(|field| {
                let column = quoted(field);
                format!("{column} = EXCLUDED.{column}")
            })
            .collect();
        let upsert = format!(
            r#"{insert} ON CONFLICT ("Key") DO UPDATE SET {}"#,
            updates.join(", ")
        );

        let all_columns: Vec<String> = UserField::ALL.into_iter().map(quoted).collect();
        let select_by = |field: UserField| {
            format!(
                r#"SELECT {} FROM "{table}" WHERE {} = $1 ORDER BY "ID" LIMIT 1"#,
                all_columns.join(", "),
                quoted(field)
            )
        };

        Self {
            select_by_key: select_by(UserField::Key),
            select_by_confirm_token: select_by(UserField::ConfirmToken),
            select_by_recover_token: select_by(UserField::RecoverToken),
            insert,
            upsert,
        }
    }
}
