//! Read-only access to a MacDive Core Data store.
//!
//! Each query is a fixed projection over one table (or one table plus its
//! lookup tables) and yields plain rows. NULL columns stay `None`; a value
//! whose storage class does not fit the column is logged and read as `None`
//! as well.

use std::path::Path;

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, Result as SqlResult, Row};

use crate::error::{ImportError, ImportResult};

#[derive(Debug, Clone, PartialEq)]
pub struct SiteRow {
    pub pk: i64,
    pub name: Option<String>,
    pub location: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub water_type: Option<String>,
    pub difficulty: Option<String>,
    pub altitude: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuddyRow {
    pub pk: i64,
    pub name: Option<String>,
    pub uuid: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TagRow {
    pub pk: i64,
    pub name: Option<String>,
}

/// A `ZTANKANDGAS` row with its tank and gas definitions joined in.
#[derive(Debug, Clone, PartialEq)]
pub struct TankUsageRow {
    pub dive_pk: Option<i64>,
    pub is_double: Option<i64>,
    pub order: Option<i64>,
    pub duration: Option<f64>,
    pub supply_type: Option<String>,
    pub air_end: Option<f64>,
    pub air_start: Option<f64>,
    pub uuid: Option<String>,
    pub tank_size: Option<f64>,
    pub working_pressure: Option<f64>,
    pub tank_name: Option<String>,
    pub tank_type: Option<String>,
    pub oxygen: Option<f64>,
    pub helium: Option<f64>,
    pub min_ppo2: Option<f64>,
    pub max_ppo2: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiveRow {
    pub pk: i64,
    pub number: Option<i64>,
    /// Seconds since the Core Data reference date.
    pub raw_date: Option<f64>,
    pub total_duration: Option<f64>,
    pub max_depth: Option<f64>,
    pub average_depth: Option<f64>,
    pub site_pk: Option<i64>,
    pub repetitive_dive_number: Option<i64>,
    pub surface_interval: Option<f64>,
    pub air_temp: Option<f64>,
    pub temp_high: Option<f64>,
    pub temp_low: Option<f64>,
    pub weather: Option<String>,
    pub current: Option<String>,
    pub surface_conditions: Option<String>,
    pub visibility: Option<String>,
    pub entry_type: Option<String>,
    pub decompression: Option<i64>,
    pub has_air: Option<i64>,
    pub has_ndt: Option<i64>,
    pub has_ppo2: Option<i64>,
    pub has_temp: Option<i64>,
    pub cns: Option<f64>,
    pub deco_model: Option<String>,
    pub gas_model: Option<String>,
    pub sample_interval: Option<f64>,
    pub boat_captain: Option<String>,
    pub boat_name: Option<String>,
    pub divemaster: Option<String>,
    pub dive_operator: Option<String>,
    pub rating: Option<f64>,
    pub notes: Option<String>,
}

/// One join-table row. Either side may be NULL in a damaged store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiveLink {
    pub dive_pk: Option<i64>,
    pub other_pk: Option<i64>,
}

const SITES_SQL: &str = "
    SELECT Z_PK, ZNAME, ZLOCATION, ZCOUNTRY, ZGPSLAT, ZGPSLON,
           ZWATERTYPE, ZDIFFICULTY, ZALTITUDE, ZNOTES
    FROM ZDIVESITE
    ORDER BY Z_PK";

const BUDDIES_SQL: &str = "SELECT Z_PK, ZNAME, ZUUID FROM ZBUDDY ORDER BY Z_PK";

const TAGS_SQL: &str = "SELECT Z_PK, ZNAME FROM ZTAG ORDER BY Z_PK";

const TANK_USAGE_SQL: &str = "
    SELECT tg.ZRELATIONSHIPDIVE, tg.ZISDOUBLE, tg.ZORDER, tg.ZDURATION,
           tg.ZSUPPLYTYPE, tg.ZAIREND, tg.ZAIRSTART, tg.ZUUID,
           t.ZSIZE, t.ZWORKINGPRESSURE, t.ZNAME, t.ZTYPE,
           g.ZOXYGEN, g.ZHELIUM, g.ZMINPPO2, g.ZMAXPPO2
    FROM ZTANKANDGAS tg
    LEFT JOIN ZTANK t ON t.Z_PK = tg.ZRELATIONSHIPTANK
    LEFT JOIN ZGAS g ON g.Z_PK = tg.ZRELATIONSHIPGAS
    ORDER BY tg.Z_PK";

const DIVES_SQL: &str = "
    SELECT Z_PK, ZDIVENUMBER, ZRAWDATE, ZTOTALDURATION, ZMAXDEPTH, ZAVERAGEDEPTH,
           ZRELATIONSHIPDIVESITE, ZREPETITIVEDIVENUMBER, ZSURFACEINTERVAL,
           ZAIRTEMP, ZTEMPHIGH, ZTEMPLOW, ZWEATHER, ZCURRENT, ZSURFACECONDITIONS,
           ZVISIBILITY, ZENTRYTYPE,
           ZDECOMPRESSION, ZHASAIR, ZHASNDT, ZHASPPO2, ZHASTEMP, ZCNS,
           ZDECOMODEL, ZGASMODEL, ZSAMPLEINTERVAL,
           ZBOATCAPTAIN, ZBOATNAME, ZDIVEMASTER, ZDIVEOPERATOR,
           ZRATING, ZNOTES
    FROM ZDIVE
    ORDER BY Z_PK";

/// Buddy ↔ dive join table.
pub const BUDDY_LINK_TABLE: &str = "Z_1RELATIONSHIPDIVE";
const BUDDY_LINKS_SQL: &str =
    "SELECT Z_5RELATIONSHIPDIVE, Z_1RELATIONSHIPBUDDIES FROM Z_1RELATIONSHIPDIVE";

/// Dive ↔ tag join table.
pub const TAG_LINK_TABLE: &str = "Z_5RELATIONSHIPTAGS";
const TAG_LINKS_SQL: &str =
    "SELECT Z_5RELATIONSHIPDIVES, Z_17RELATIONSHIPTAGS FROM Z_5RELATIONSHIPTAGS";

/// An open, read-only MacDive store.
///
/// The connection closes when the reader is dropped.
pub struct MacDiveReader {
    conn: Connection,
}

impl MacDiveReader {
    pub fn open(path: impl AsRef<Path>) -> ImportResult<Self> {
        let path = path.as_ref();
        let unavailable = |source| ImportError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        };

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(unavailable)?;

        // Opening is lazy; make sure the file really is a database.
        conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        })
        .map_err(unavailable)?;

        Ok(Self { conn })
    }

    pub fn sites(&self) -> ImportResult<Vec<SiteRow>> {
        self.query(SITES_SQL, |row| {
            Ok(SiteRow {
                pk: row.get(0)?,
                name: text(row, 1)?,
                location: text(row, 2)?,
                country: text(row, 3)?,
                latitude: real(row, 4)?,
                longitude: real(row, 5)?,
                water_type: text(row, 6)?,
                difficulty: text(row, 7)?,
                altitude: real(row, 8)?,
                notes: text(row, 9)?,
            })
        })
    }

    pub fn buddies(&self) -> ImportResult<Vec<BuddyRow>> {
        self.query(BUDDIES_SQL, |row| {
            Ok(BuddyRow {
                pk: row.get(0)?,
                name: text(row, 1)?,
                uuid: text(row, 2)?,
            })
        })
    }

    pub fn tags(&self) -> ImportResult<Vec<TagRow>> {
        self.query(TAGS_SQL, |row| {
            Ok(TagRow {
                pk: row.get(0)?,
                name: text(row, 1)?,
            })
        })
    }

    pub fn tank_usages(&self) -> ImportResult<Vec<TankUsageRow>> {
        self.query(TANK_USAGE_SQL, |row| {
            Ok(TankUsageRow {
                dive_pk: integer(row, 0)?,
                is_double: integer(row, 1)?,
                order: integer(row, 2)?,
                duration: real(row, 3)?,
                supply_type: text(row, 4)?,
                air_end: real(row, 5)?,
                air_start: real(row, 6)?,
                uuid: text(row, 7)?,
                tank_size: real(row, 8)?,
                working_pressure: real(row, 9)?,
                tank_name: text(row, 10)?,
                tank_type: text(row, 11)?,
                oxygen: real(row, 12)?,
                helium: real(row, 13)?,
                min_ppo2: real(row, 14)?,
                max_ppo2: real(row, 15)?,
            })
        })
    }

    pub fn dives(&self) -> ImportResult<Vec<DiveRow>> {
        self.query(DIVES_SQL, |row| {
            Ok(DiveRow {
                pk: row.get(0)?,
                number: integer(row, 1)?,
                raw_date: real(row, 2)?,
                total_duration: real(row, 3)?,
                max_depth: real(row, 4)?,
                average_depth: real(row, 5)?,
                site_pk: integer(row, 6)?,
                repetitive_dive_number: integer(row, 7)?,
                surface_interval: real(row, 8)?,
                air_temp: real(row, 9)?,
                temp_high: real(row, 10)?,
                temp_low: real(row, 11)?,
                weather: text(row, 12)?,
                current: text(row, 13)?,
                surface_conditions: text(row, 14)?,
                visibility: text(row, 15)?,
                entry_type: text(row, 16)?,
                decompression: integer(row, 17)?,
                has_air: integer(row, 18)?,
                has_ndt: integer(row, 19)?,
                has_ppo2: integer(row, 20)?,
                has_temp: integer(row, 21)?,
                cns: real(row, 22)?,
                deco_model: text(row, 23)?,
                gas_model: text(row, 24)?,
                sample_interval: real(row, 25)?,
                boat_captain: text(row, 26)?,
                boat_name: text(row, 27)?,
                divemaster: text(row, 28)?,
                dive_operator: text(row, 29)?,
                rating: real(row, 30)?,
                notes: text(row, 31)?,
            })
        })
    }

    pub fn buddy_links(&self) -> ImportResult<Vec<DiveLink>> {
        self.query(BUDDY_LINKS_SQL, link)
    }

    pub fn tag_links(&self) -> ImportResult<Vec<DiveLink>> {
        self.query(TAG_LINKS_SQL, link)
    }

    fn query<T, F>(&self, sql: &str, map: F) -> ImportResult<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> SqlResult<T>,
    {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], map)?.collect::<SqlResult<Vec<_>>>()?;
        Ok(rows)
    }
}

fn link(row: &Row<'_>) -> SqlResult<DiveLink> {
    Ok(DiveLink {
        dive_pk: integer(row, 0)?,
        other_pk: integer(row, 1)?,
    })
}

/// `FieldUnparsable` naming the column at `idx`.
fn column_error(row: &Row<'_>, idx: usize, value: &str) -> ImportError {
    let statement: &rusqlite::Statement<'_> = row.as_ref();
    let column = statement.column_name(idx).unwrap_or("?");
    ImportError::unparsable(column, value)
}

fn unparsable(row: &Row<'_>, idx: usize, value: &str) {
    tracing::debug!(error = %column_error(row, idx, value), "column value left unset");
}

/// Numeric column as `f64`. Numeric text is accepted.
fn real(row: &Row<'_>, idx: usize) -> SqlResult<Option<f64>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i as f64),
        ValueRef::Real(f) => Some(f),
        ValueRef::Text(bytes) => {
            let raw = String::from_utf8_lossy(bytes);
            let parsed = raw.trim().parse::<f64>().ok();
            if parsed.is_none() {
                unparsable(row, idx, &raw);
            }
            parsed
        }
        ValueRef::Blob(_) => {
            unparsable(row, idx, "<blob>");
            None
        }
    })
}

/// Integer column. Whole reals and integer text are accepted.
fn integer(row: &Row<'_>, idx: usize) -> SqlResult<Option<i64>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i),
        ValueRef::Real(f) if f.fract() == 0.0 && f.is_finite() => Some(f as i64),
        ValueRef::Real(f) => {
            unparsable(row, idx, &f.to_string());
            None
        }
        ValueRef::Text(bytes) => {
            let raw = String::from_utf8_lossy(bytes);
            let parsed = raw.trim().parse::<i64>().ok();
            if parsed.is_none() {
                unparsable(row, idx, &raw);
            }
            parsed
        }
        ValueRef::Blob(_) => {
            unparsable(row, idx, "<blob>");
            None
        }
    })
}

/// Text column. Numbers are rendered as text.
fn text(row: &Row<'_>, idx: usize) -> SqlResult<Option<String>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => None,
        ValueRef::Text(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Blob(_) => {
            unparsable(row, idx, "<blob>");
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar<T>(sql: &str, read: fn(&Row<'_>, usize) -> SqlResult<T>) -> T {
        let conn = Connection::open_in_memory().unwrap();
        conn.query_row(sql, [], |row| read(row, 0)).unwrap()
    }

    #[test]
    fn test_lenient_column_readers() {
        assert_eq!(scalar("SELECT ' 12.5 '", real), Some(12.5));
        assert_eq!(scalar("SELECT 'deep'", real), None);
        assert_eq!(scalar("SELECT x'00'", real), None);
        assert_eq!(scalar("SELECT 3.0", integer), Some(3));
        assert_eq!(scalar("SELECT 3.5", integer), None);
        assert_eq!(scalar("SELECT NULL", text), None);
    }

    #[test]
    fn test_column_error_names_column() {
        let conn = Connection::open_in_memory().unwrap();
        let err = conn
            .query_row("SELECT 'deep' AS ZMAXDEPTH", [], |row| {
                Ok(column_error(row, 0, "deep"))
            })
            .unwrap();
        assert_eq!(err.to_string(), "unparsable ZMAXDEPTH: 'deep'");
        assert!(!err.is_structural());
    }
}
