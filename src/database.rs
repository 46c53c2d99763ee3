use std::future::IntoFuture;
use std::time::Duration;

use snafu::{Location, OptionExt as _, ResultExt as _, Snafu};
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::Root;
use surrealdb::opt::QueryResult;
use surrealdb::Surreal;
use url::Url;

pub use surrealdb::sql::Thing;

use crate::config::SurrealConfig;

pub type Result<T, E = DatabaseError> = std::result::Result<T, E>;

/// Upper bound on a single round-trip to the database. The store is expected
/// to fail fast rather than hang; this enforces it.
const ROUND_TRIP_DEADLINE: Duration = Duration::from_secs(5);

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DatabaseError {
    #[snafu(display("cannot connect to the database `{url}` at {location}: {source}"))]
    DatabaseConnection {
        url: Url,
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("failed to query the database at {location}: {source}"))]
    DatabaseQuery {
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("failed to deserialize the database response at {location}: {source}"))]
    DatabaseDeserialize {
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("failed to parse the database response at {location}: response is empty"))]
    EmptyQuery {
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("the database did not answer within {ROUND_TRIP_DEADLINE:?} at {location}"))]
    QueryTimeout {
        #[snafu(implicit)]
        location: Location,
    },
}

/// A handle to the SurrealDB instance holding the `users`, `courses` and
/// `stats` tables.
#[derive(Debug, Clone)]
pub struct Database {
    database: Surreal<Any>,
}

impl Database {
    pub async fn connect(config: &SurrealConfig) -> Result<Self> {
        let context = DatabaseConnectionSnafu {
            url: config.endpoint.clone(),
        };

        let database = surrealdb::engine::any::connect(config.endpoint.as_str())
            .await
            .context(context.clone())?;

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            let credentials = Root {
                username: username.as_str(),
                password: password.as_str(),
            };
            database.signin(credentials).await.context(context.clone())?;
        }

        database
            .use_ns(config.namespace.as_str())
            .use_db(config.database.as_str())
            .await
            .context(context)?;

        Ok(Self { database })
    }

    /// Create a builder to execute arbitrary SQL on the database.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let snapshots: Vec<Snapshot> = db
    ///     .sql("SELECT * FROM stats ORDER BY created_at DESC LIMIT $limit")
    ///     .bind(("limit", 12))
    ///     .fetch()
    ///     .await?;
    /// ```
    pub fn sql(&self, query: impl surrealdb::opt::IntoQuery) -> Query<'_> {
        let query = self.database.query(query);
        Query { query }
    }
}

impl std::ops::Deref for Database {
    type Target = Surreal<Any>;

    fn deref(&self) -> &Self::Target {
        &self.database
    }
}

/// Run a database round-trip under [ROUND_TRIP_DEADLINE].
pub async fn deadline<T, F>(future: F) -> Result<T>
where
    F: IntoFuture<Output = std::result::Result<T, surrealdb::Error>>,
{
    tokio::time::timeout(ROUND_TRIP_DEADLINE, future.into_future())
        .await
        .ok()
        .context(QueryTimeoutSnafu)?
        .context(DatabaseQuerySnafu)
}

#[derive(Debug)]
pub struct Query<'a> {
    query: surrealdb::method::Query<'a, Any>,
}

impl Query<'_> {
    pub fn bind(mut self, params: impl serde::Serialize) -> Self {
        let query = self.query;
        self.query = query.bind(params);
        self
    }

    /// Execute the query and deserialize the first statement's result. The
    /// result can be a single value (`Option<T>`) or a collection (`Vec<T>`).
    pub async fn fetch<T: serde::de::DeserializeOwned>(self) -> Result<T>
    where
        usize: QueryResult<T>,
    {
        let response = tokio::time::timeout(ROUND_TRIP_DEADLINE, self.query)
            .await
            .ok()
            .context(QueryTimeoutSnafu)?;

        let mut statements = response.context(DatabaseQuerySnafu)?;
        let result = statements.take::<T>(0).context(DatabaseDeserializeSnafu)?;
        Ok(result)
    }
}
