use serde::Deserialize;

/// Config, read from the TOML file named on the command line.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// <address>:<port> to serve the site on
    pub listen_address: String,

    /// <address>:<port> to serve admin endpoints (cache clear, group management). Keep this on a
    /// private network; it has no auth.
    pub admin_listen_address: String,

    /// <address>:<port> to serve metrics on
    pub metrics_address: String,

    /// By default, output JSON logs. Only if this flag is set to true, output colourful human-friendly logs
    pub human_logs: bool,

    /// Max HTTP body size the site accepts, uploaded images included.
    #[serde(default = "max_body_size")]
    pub max_body_size: usize,

    /// password to connect to database.
    pub db_dsn: String,

    /// maximum number of connections maintained by PostgresStore
    pub db_pool_size: u32,

    /// maximum seconds waiting for a database connection
    pub db_connection_timeout: u64,

    /// HMAC secret shared with the identity service, used to verify session tokens.
    pub session_secret: String,

    /// Where unauthenticated visitors are sent. A `next` parameter is appended.
    #[serde(default = "login_url")]
    pub login_url: String,

    /// How long a rendered index page is served from cache.
    #[serde(default = "index_cache_secs")]
    pub index_cache_secs: u64,

    /// Most rendered index pages kept in cache at once.
    #[serde(default = "index_cache_capacity")]
    pub index_cache_capacity: u64,

    /// Directory uploaded images are written into.
    #[serde(default = "media_root")]
    pub media_root: String,

    /// URL prefix uploaded images are served from (by a static file server).
    #[serde(default = "media_url")]
    pub media_url: String,
}

impl Config {
    /// Will crash if file isn't found or config is invalid.
    pub fn from_file(filepath: &str) -> Self {
        let contents = std::fs::read_to_string(filepath).expect("Couldn't read from config file");
        Self::from_toml(&contents).expect("couldn't parse config file")
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }
}

fn max_body_size() -> usize {
    10 * 1024 * 1024
}

fn login_url() -> String {
    crate::auth::DEFAULT_LOGIN_URL.to_owned()
}

fn index_cache_secs() -> u64 {
    20
}

fn index_cache_capacity() -> u64 {
    1000
}

fn media_root() -> String {
    "media".to_owned()
}

fn media_url() -> String {
    "/media/".to_owned()
}
