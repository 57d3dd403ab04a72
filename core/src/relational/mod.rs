//! MacDive (Core Data SQLite) import.

pub mod importer;
pub mod schema;

pub use importer::{import, import_with, MacDiveImporter};

#[cfg(test)]
pub(crate) mod fixture {
    //! Builds throwaway stores with the subset of the MacDive schema we read.

    use std::path::{Path, PathBuf};

    use rusqlite::{params, Connection};

    const SCHEMA: &str = "
        CREATE TABLE ZDIVESITE (
            Z_PK INTEGER PRIMARY KEY, ZNAME VARCHAR, ZLOCATION VARCHAR, ZCOUNTRY VARCHAR,
            ZGPSLAT FLOAT, ZGPSLON FLOAT, ZWATERTYPE VARCHAR, ZDIFFICULTY VARCHAR,
            ZALTITUDE FLOAT, ZNOTES VARCHAR
        );
        CREATE TABLE ZBUDDY (Z_PK INTEGER PRIMARY KEY, ZNAME VARCHAR, ZUUID VARCHAR);
        CREATE TABLE ZTAG (Z_PK INTEGER PRIMARY KEY, ZNAME VARCHAR);
        CREATE TABLE ZTANK (
            Z_PK INTEGER PRIMARY KEY, ZSIZE FLOAT, ZWORKINGPRESSURE FLOAT,
            ZNAME VARCHAR, ZTYPE VARCHAR
        );
        CREATE TABLE ZGAS (
            Z_PK INTEGER PRIMARY KEY, ZOXYGEN FLOAT, ZHELIUM FLOAT,
            ZMINPPO2 FLOAT, ZMAXPPO2 FLOAT
        );
        CREATE TABLE ZTANKANDGAS (
            Z_PK INTEGER PRIMARY KEY, ZRELATIONSHIPDIVE INTEGER, ZRELATIONSHIPTANK INTEGER,
            ZRELATIONSHIPGAS INTEGER, ZISDOUBLE INTEGER, ZORDER INTEGER, ZDURATION FLOAT,
            ZSUPPLYTYPE VARCHAR, ZAIREND FLOAT, ZAIRSTART FLOAT, ZUUID VARCHAR
        );
        CREATE TABLE ZDIVE (
            Z_PK INTEGER PRIMARY KEY, ZDIVENUMBER INTEGER, ZRAWDATE TIMESTAMP,
            ZTOTALDURATION FLOAT, ZMAXDEPTH FLOAT, ZAVERAGEDEPTH FLOAT,
            ZRELATIONSHIPDIVESITE INTEGER, ZREPETITIVEDIVENUMBER INTEGER,
            ZSURFACEINTERVAL FLOAT, ZAIRTEMP FLOAT, ZTEMPHIGH FLOAT, ZTEMPLOW FLOAT,
            ZWEATHER VARCHAR, ZCURRENT VARCHAR, ZSURFACECONDITIONS VARCHAR,
            ZVISIBILITY VARCHAR, ZENTRYTYPE VARCHAR, ZDECOMPRESSION INTEGER,
            ZHASAIR INTEGER, ZHASNDT INTEGER, ZHASPPO2 INTEGER, ZHASTEMP INTEGER,
            ZCNS FLOAT, ZDECOMODEL VARCHAR, ZGASMODEL VARCHAR, ZSAMPLEINTERVAL FLOAT,
            ZBOATCAPTAIN VARCHAR, ZBOATNAME VARCHAR, ZDIVEMASTER VARCHAR,
            ZDIVEOPERATOR VARCHAR, ZRATING FLOAT, ZNOTES VARCHAR
        );
        CREATE TABLE Z_1RELATIONSHIPDIVE (
            Z_1RELATIONSHIPBUDDIES INTEGER, Z_5RELATIONSHIPDIVE INTEGER
        );
        CREATE TABLE Z_5RELATIONSHIPTAGS (
            Z_5RELATIONSHIPDIVES INTEGER, Z_17RELATIONSHIPTAGS INTEGER
        );
    ";

    pub struct Store {
        pub path: PathBuf,
        pub conn: Connection,
    }

    impl Store {
        pub fn create(dir: &Path) -> Self {
            let path = dir.join("MacDive.sqlite");
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(SCHEMA).unwrap();
            Self { path, conn }
        }

        pub fn site(&self, pk: i64, name: &str) {
            self.conn
                .execute(
                    "INSERT INTO ZDIVESITE (Z_PK, ZNAME) VALUES (?1, ?2)",
                    params![pk, name],
                )
                .unwrap();
        }

        pub fn buddy(&self, pk: i64, name: &str) {
            self.conn
                .execute(
                    "INSERT INTO ZBUDDY (Z_PK, ZNAME, ZUUID) VALUES (?1, ?2, ?3)",
                    params![pk, name, format!("buddy-{pk}")],
                )
                .unwrap();
        }

        pub fn tag(&self, pk: i64, name: &str) {
            self.conn
                .execute("INSERT INTO ZTAG (Z_PK, ZNAME) VALUES (?1, ?2)", params![pk, name])
                .unwrap();
        }

        /// Dive header with only the summary columns set.
        pub fn dive(
            &self,
            pk: i64,
            number: i64,
            duration_sec: f64,
            max_depth: f64,
            site: Option<i64>,
        ) {
            self.conn
                .execute(
                    "INSERT INTO ZDIVE (Z_PK, ZDIVENUMBER, ZRAWDATE, ZTOTALDURATION, ZMAXDEPTH,
                                        ZAVERAGEDEPTH, ZRELATIONSHIPDIVESITE)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        pk,
                        number,
                        700_000_000.0,
                        duration_sec,
                        max_depth,
                        max_depth * 0.6,
                        site
                    ],
                )
                .unwrap();
        }

        pub fn link_buddy(&self, buddy_pk: i64, dive_pk: i64) {
            self.conn
                .execute(
                    "INSERT INTO Z_1RELATIONSHIPDIVE VALUES (?1, ?2)",
                    params![buddy_pk, dive_pk],
                )
                .unwrap();
        }

        pub fn link_tag(&self, dive_pk: i64, tag_pk: i64) {
            self.conn
                .execute(
                    "INSERT INTO Z_5RELATIONSHIPTAGS VALUES (?1, ?2)",
                    params![dive_pk, tag_pk],
                )
                .unwrap();
        }
    }
}
