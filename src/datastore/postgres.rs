pub mod post_store;
use crate::config::Config;
use crate::twoface::{BlockingResp, Cause, DescribeErr, ExternalError, Fallible, TfError};
use actix_web::web::block;
use diesel::{
    pg::PgConnection,
    r2d2::{ConnectionManager, Pool},
};
use prometheus::{
    core::{Collector, Desc},
    proto::MetricFamily,
    IntGauge, Opts,
};
use std::time::Duration;

pub struct Dsn {
    secret: String,
}

impl Dsn {
    pub fn new(config: &Config) -> Self {
        Dsn {
            secret: config.db_dsn.clone(),
        }
    }
}

impl From<Dsn> for String {
    fn from(dsn: Dsn) -> String {
        dsn.secret
    }
}

const POOL_EXHAUSTED: ExternalError = ExternalError {
    cause: Cause::ServerError,
    text: "The database is busy, try again shortly",
};

/// An implementation of datastore::Datastore backed by Postgres
#[derive(Clone)]
pub struct PostgresStore {
    pool: Pool<ConnectionManager<PgConnection>>,
    idle_conns: IntGauge,
    conns: IntGauge,
}

impl PostgresStore {
    pub fn new(
        dsn: Dsn,
        max_pool_size: u32,
        conn_timeout: Duration,
    ) -> Result<Self, anyhow::Error> {
        let manager = ConnectionManager::<PgConnection>::new(dsn);
        let pool = Pool::builder()
            .max_size(max_pool_size)
            .connection_timeout(conn_timeout)
            .build(manager)?;
        let idle_conns = IntGauge::with_opts(Opts::new(
            "inkwell_db_connections_idle",
            "How many DB connections are currently idle",
        ))?;
        let conns = IntGauge::with_opts(Opts::new(
            "inkwell_db_connections",
            "How many DB connections are open",
        ))?;
        Ok(Self {
            pool,
            idle_conns,
            conns,
        })
    }

    /// Check out a connection and run `f` with it, both on the blocking thread pool, since
    /// waiting for a free connection can take up to the pool's timeout.
    async fn with_conn<T, E, F>(&self, f: F) -> Fallible<T>
    where
        F: FnOnce(&PgConnection) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Into<TfError> + Send + 'static,
    {
        let pool = self.pool.clone();
        block(move || -> Fallible<T> {
            let conn = pool.get().describe_err(POOL_EXHAUSTED)?;
            f(&conn).map_err(Into::into)
        })
        .await
        .to_resp()
    }
}

impl Collector for PostgresStore {
    fn desc(&self) -> Vec<&Desc> {
        let mut descs = self.idle_conns.desc();
        descs.extend(self.conns.desc());
        descs
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let state = self.pool.state();
        self.idle_conns.set(i64::from(state.idle_connections));
        self.conns.set(i64::from(state.connections));
        let mut metrics = self.idle_conns.collect();
        metrics.extend(self.conns.collect());
        metrics
    }
}
