//! Bind values and named-parameter rewriting for runtime-built queries.

use crate::error::AppError;
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::Database;

/// A value that can be bound to a PostgreSQL query. Covers the types this
/// schema actually stores.
#[derive(Clone, Debug)]
pub enum BindValue {
    Null,
    Bool(bool),
    I64(i64),
    Text(String),
}

impl From<&str> for BindValue {
    fn from(s: &str) -> Self {
        BindValue::Text(s.to_string())
    }
}

impl From<String> for BindValue {
    fn from(s: String) -> Self {
        BindValue::Text(s)
    }
}

impl From<i64> for BindValue {
    fn from(n: i64) -> Self {
        BindValue::I64(n)
    }
}

impl From<bool> for BindValue {
    fn from(b: bool) -> Self {
        BindValue::Bool(b)
    }
}

impl<'q> Encode<'q, Postgres> for BindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        Ok(match self {
            BindValue::Null => <Option<i32> as Encode<Postgres>>::encode_by_ref(&None, buf)?,
            BindValue::Bool(b) => <bool as Encode<Postgres>>::encode_by_ref(b, buf)?,
            BindValue::I64(n) => <i64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            BindValue::Text(s) => {
                let s_ref: &str = s.as_str();
                <&str as Encode<Postgres>>::encode_by_ref(&s_ref, buf)?
            }
        })
    }

    fn produces(&self) -> Option<PgTypeInfo> {
        Some(match self {
            BindValue::Null | BindValue::Text(_) => PgTypeInfo::with_name("TEXT"),
            BindValue::Bool(_) => PgTypeInfo::with_name("BOOL"),
            BindValue::I64(_) => PgTypeInfo::with_name("INT8"),
        })
    }
}

impl sqlx::Type<Postgres> for BindValue {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("TEXT")
    }
}

/// Rewrite `:name` placeholders to positional `$n` and order the bind values
/// accordingly. Placeholders are numbered in order of first use; a repeated
/// name reuses its number. `::` type casts are left untouched. An unknown
/// placeholder is an authoring error.
pub fn bind_named(
    sql: &str,
    params: &[(&str, BindValue)],
) -> Result<(String, Vec<BindValue>), AppError> {
    let mut out = Vec::with_capacity(sql.len());
    let mut values: Vec<BindValue> = Vec::with_capacity(params.len());
    let mut positions: Vec<(&str, usize)> = Vec::with_capacity(params.len());

    let bytes = sql.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b':' {
            // `::` is a cast, not a placeholder
            if i + 1 < bytes.len() && bytes[i + 1] == b':' {
                out.extend_from_slice(b"::");
                i += 2;
                continue;
            }
            let start = i + 1;
            let mut end = start;
            while end < bytes.len()
                && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_')
            {
                end += 1;
            }
            if end == start {
                out.push(b':');
                i += 1;
                continue;
            }
            let name = &sql[start..end];
            let pos = match positions.iter().find(|(n, _)| *n == name) {
                Some((_, pos)) => *pos,
                None => {
                    let (_, value) = params
                        .iter()
                        .find(|(n, _)| *n == name)
                        .ok_or_else(|| {
                            AppError::Internal(format!("unbound query parameter :{name}"))
                        })?;
                    values.push(value.clone());
                    let pos = values.len();
                    positions.push((name, pos));
                    pos
                }
            };
            out.push(b'$');
            out.extend_from_slice(pos.to_string().as_bytes());
            i = end;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    let out = String::from_utf8(out)
        .map_err(|_| AppError::Internal("query is not valid utf-8".into()))?;
    Ok((out, values))
}
