pub mod activity_repo;
pub mod attendance_repo;
pub mod course_repo;
pub mod group_repo;
pub mod progress_repo;
pub mod response_repo;
pub mod schema;
pub mod service_repo;
pub mod user_repo;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

use crate::model::{AttendanceType, Gender, ResponseStatus, Role};

/// Text-backed enums are stored by their `to_db_str` name.
macro_rules! text_enum_sql {
    ($($ty:ty),* $(,)?) => {$(
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.to_db_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let s = value.as_str()?;
                <$ty>::from_db_str(s).ok_or_else(|| {
                    FromSqlError::Other(format!("unknown {}: {}", stringify!($ty), s).into())
                })
            }
        }
    )*};
}

text_enum_sql!(Gender, Role, ResponseStatus, AttendanceType);
