use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use couch_fs::CouchConfig;

#[derive(Parser, Debug)]
#[command(
    name = "couchfs",
    about = "Mirror CouchDB design documents as a directory of .js files",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub server: ServerArgs,

    /// Directory holding one sub directory per database
    #[arg(long, env = "COUCHFS_PATH", default_value = ".")]
    pub path: PathBuf,

    /// Logging level (debug, info, warn, error, fatal); RUST_LOG takes precedence
    #[arg(long = "log", env = "COUCHFS_LOG", default_value = "info")]
    pub log_level: String,
}

#[derive(Args, Debug)]
pub struct ServerArgs {
    /// Server address and port
    #[arg(long, env = "COUCHDB_SERVER", default_value = "http://localhost:5984")]
    pub server: String,

    /// Database holding the design document
    #[arg(long, env = "COUCHDB_DATABASE")]
    pub database: String,

    /// User name
    #[arg(long, env = "COUCHDB_USER")]
    pub user: Option<String>,

    /// User password
    #[arg(long, env = "COUCHDB_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a design document to <path>/<database>/<name>
    Download {
        /// Document id, e.g. _design/indexes
        id: String,
    },
    /// Store <path>/<database>/<name> as a design document
    Upload {
        /// Document id, e.g. _design/indexes
        id: String,

        /// Do not send the _rev read from disk
        #[arg(long)]
        ignore_rev: bool,
    },
}

impl From<ServerArgs> for CouchConfig {
    fn from(args: ServerArgs) -> Self {
        CouchConfig {
            server: args.server,
            database: args.database,
            user: args.user,
            password: args.password,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let cli = Cli::try_parse_from([
            "couchfs",
            "--database",
            "my-database",
            "--path",
            "/tmp/couchdb",
            "upload",
            "_design/indexes",
            "--ignore-rev",
        ])
        .unwrap();

        assert_eq!(cli.server.database, "my-database");
        assert_eq!(cli.path, PathBuf::from("/tmp/couchdb"));
        match cli.command {
            Command::Upload { id, ignore_rev } => {
                assert_eq!(id, "_design/indexes");
                assert!(ignore_rev);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_requires_command() {
        assert!(Cli::try_parse_from(["couchfs", "--database", "db"]).is_err());
        assert!(Cli::try_parse_from(["couchfs", "--database", "db", "sync", "x"]).is_err());
    }
}
