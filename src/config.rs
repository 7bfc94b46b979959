use serde::Deserialize;

/// Config, from a TOML file named on the command line.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// <address>:<port> to serve the site on
    pub userfacing_listen_address: String,

    /// <address>:<port> to serve metrics on
    pub metrics_address: String,

    /// By default, output JSON logs. Only if this flag is set to true, output colourful human-friendly logs
    pub human_logs: bool,

    /// Max HTTP body size accepted for form and upload requests
    #[serde(default = "max_body_size")]
    pub max_body_size: usize,

    /// DSN to connect to the database.
    pub db_dsn: String,

    /// maximum number of connections maintained by PostgresStore
    pub db_pool_size: u32,

    /// maximum seconds waiting for a database connection
    pub db_connection_timeout: u64,

    /// How many posts each listing page shows
    #[serde(default = "page_size")]
    pub page_size: i64,

    /// How long rendered home pages may be served from cache, in seconds
    #[serde(default = "cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// How long a login session lasts before it expires, in hours
    #[serde(default = "session_ttl_hours")]
    pub session_ttl_hours: i64,

    /// Directory where uploaded images are stored and served from
    #[serde(default = "media_root")]
    pub media_root: String,
}

impl Config {
    /// Will crash if file isn't found or config is invalid.
    pub fn from_file(filepath: &str) -> Self {
        let contents = std::fs::read_to_string(filepath).expect("Couldn't read from config file");
        toml::from_str(&contents).expect("couldn't parse config file")
    }
}

fn max_body_size() -> usize {
    65536
}

fn page_size() -> i64 {
    10
}

fn cache_ttl_secs() -> u64 {
    20
}

fn session_ttl_hours() -> i64 {
    // Two weeks.
    336
}

fn media_root() -> String {
    "media".to_owned()
}
