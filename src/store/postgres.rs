use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DatabaseConnection, FromQueryResult, Statement, Value};

use super::{city_not_found, CityStore};
use crate::entities::city::validate_point;
use crate::entities::{City, NearbyCity, NewCity};
use crate::error::{AppError, AppResult};

// `<->` on geography ranks by sphere distance through the GiST index, which
// can disagree with the spheroid ranking. The k sphere-nearest rows give an
// upper bound on the k-th spheroid distance; every true top-k city then lies
// within that bound (scaled to sphere distance) and `ST_DWithin` pulls them
// all from the index before the final spheroid sort. With fewer than k rows
// in the table the radius covers the whole globe.
const NEAREST_SQL: &str = r#"
WITH query AS (
    SELECT ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography AS point
),
candidates AS (
    SELECT ST_Distance(c.location, q.point) AS distance
    FROM cities c, query q
    ORDER BY c.location <-> q.point
    LIMIT $3
),
radius AS (
    SELECT CASE
               WHEN count(*) < $3 THEN 1.0e8
               ELSE max(distance) * $4 + 1.0
           END AS meters
    FROM candidates
)
SELECT c.id,
       c.name,
       ST_X(c.location::geometry) AS lon,
       ST_Y(c.location::geometry) AS lat,
       ST_Distance(c.location, q.point) AS distance
FROM cities c, query q, radius r
WHERE ST_DWithin(c.location, q.point, r.meters, false)
ORDER BY distance, c.id
LIMIT $3
"#;

/// Upper bound on sphere distance over spheroid distance for the same pair
/// of points. PostGIS's sphere (6 371 008.8 m) overshoots the spheroid by at
/// most about 0.56%, along meridians near the equator.
const SPHERE_OVER_SPHEROID: f64 = 1.01;

const INSERT_SQL: &str = r#"
INSERT INTO cities (name, location)
VALUES ($1, ST_SetSRID(ST_MakePoint($2, $3), 4326)::geography)
RETURNING id, name, ST_X(location::geometry) AS lon, ST_Y(location::geometry) AS lat
"#;

const SELECT_ONE_SQL: &str = r#"
SELECT id, name, ST_X(location::geometry) AS lon, ST_Y(location::geometry) AS lat
FROM cities
WHERE id = $1
"#;

const SELECT_ALL_SQL: &str = r#"
SELECT id, name, ST_X(location::geometry) AS lon, ST_Y(location::geometry) AS lat
FROM cities
ORDER BY id
"#;

const DELETE_SQL: &str = "DELETE FROM cities WHERE id = $1";

/// `CityStore` on PostgreSQL with PostGIS. The connection is a sea-orm pool;
/// every method checks a connection out for a single statement.
pub struct PgCityStore {
    db: DatabaseConnection,
}

impl PgCityStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn statement<I>(&self, sql: &str, values: I) -> Statement
    where
        I: IntoIterator<Item = Value>,
    {
        Statement::from_sql_and_values(self.db.get_database_backend(), sql, values)
    }
}

#[async_trait]
impl CityStore for PgCityStore {
    async fn insert(&self, name: &str, lon: f64, lat: f64) -> AppResult<City> {
        let new_city = NewCity::new(name, lon, lat)?;

        let city = City::find_by_statement(self.statement(
            INSERT_SQL,
            [new_city.name.into(), new_city.lon.into(), new_city.lat.into()],
        ))
        .one(&self.db)
        .await?
        .ok_or_else(|| AppError::Internal("Insert returned no row".to_string()))?;

        tracing::info!(city_id = city.id, name = %city.name, "City stored");
        Ok(city)
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let result = self
            .db
            .execute(self.statement(DELETE_SQL, [id.into()]))
            .await?;

        tracing::debug!(city_id = id, rows = result.rows_affected(), "City delete");
        Ok(())
    }

    async fn get(&self, id: i32) -> AppResult<City> {
        City::find_by_statement(self.statement(SELECT_ONE_SQL, [id.into()]))
            .one(&self.db)
            .await?
            .ok_or_else(|| city_not_found(id))
    }

    async fn list(&self) -> AppResult<Vec<City>> {
        let statement = self.statement(SELECT_ALL_SQL, Vec::<Value>::new());
        let cities = City::find_by_statement(statement).all(&self.db).await?;
        Ok(cities)
    }

    async fn nearest(&self, lon: f64, lat: f64, k: u64) -> AppResult<Vec<NearbyCity>> {
        validate_point(lon, lat)?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let limit = i64::try_from(k).unwrap_or(i64::MAX);

        let cities = NearbyCity::find_by_statement(self.statement(
            NEAREST_SQL,
            [lon.into(), lat.into(), limit.into(), SPHERE_OVER_SPHEROID.into()],
        ))
        .all(&self.db)
        .await?;
        Ok(cities)
    }

    async fn ping(&self) -> AppResult<()> {
        self.db.ping().await?;
        Ok(())
    }
}
