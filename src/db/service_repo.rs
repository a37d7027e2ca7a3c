use rusqlite::{params, Connection};

use crate::error::AppResult;
use crate::model::{Id, Service};

pub fn insert(conn: &Connection, service: &Service) -> AppResult<()> {
    conn.execute(
        "INSERT INTO services (id, name) VALUES (?1, ?2)",
        params![service.id, service.name],
    )?;
    Ok(())
}

pub fn update(conn: &Connection, service: &Service) -> AppResult<()> {
    conn.execute(
        "UPDATE services SET name = ?1 WHERE id = ?2",
        params![service.name, service.id],
    )?;
    Ok(())
}

pub fn delete(conn: &Connection, id: Id<Service>) -> AppResult<()> {
    conn.execute("DELETE FROM services WHERE id = ?1", params![id])?;
    Ok(())
}

pub fn find_by_id(conn: &Connection, id: Id<Service>) -> AppResult<Option<Service>> {
    let result = conn.query_row(
        "SELECT id, name FROM services WHERE id = ?1",
        params![id],
        |row| {
            Ok(Service {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        },
    );

    match result {
        Ok(service) => Ok(Some(service)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn find_by_name(conn: &Connection, name: &str) -> AppResult<Option<Service>> {
    Ok(find_all(conn)?
        .into_iter()
        .find(|s| s.name.eq_ignore_ascii_case(name.trim())))
}

pub fn find_all(conn: &Connection) -> AppResult<Vec<Service>> {
    let mut stmt = conn.prepare("SELECT id, name FROM services ORDER BY name")?;
    let services = stmt
        .query_map([], |row| {
            Ok(Service {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(services)
}
