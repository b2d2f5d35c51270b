//! Command-line front end for the simplehttpd server.

use std::io::Write;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use clap::Parser;
use log::{debug, Level};
use nix::unistd::{getuid, User};

use simplehttpd::server::ConfigFile;
use simplehttpd::{HttpServer, ServerConfig, ServerError};

/// Serve files and directory listings over HTTP.
///
/// NOT TO BE USED IN PRODUCTION ENVIRONMENTS.
#[derive(Debug, Parser)]
#[command(name = "simplehttpd", version, about)]
struct Args {
    /// List all files, including hidden, in directories
    #[arg(short = 'a')]
    all: bool,

    /// Document root (default is ~/public_html, or . if that does not exist)
    #[arg(short = 'd', value_name = "PATH")]
    docroot: Option<PathBuf>,

    /// Bind to the given local address
    #[arg(short = 'l', value_name = "ADDRESS")]
    listen: Option<IpAddr>,

    /// Listen on the given port
    #[arg(short = 'p', value_name = "PORT")]
    port: Option<u16>,

    /// Serve /~user/ from the user's home directory
    #[arg(short = 'u')]
    userdirs: bool,

    /// Directory below a user's home that /~user/ serves
    #[arg(short = 'U', value_name = "SUFFIX")]
    userdir_suffix: Option<String>,

    /// Read settings from a JSON configuration file
    #[arg(short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of connection workers; 0 serves connections one at a time
    #[arg(short = 'w', value_name = "COUNT")]
    workers: Option<usize>,

    /// Refuse targets that resolve outside their root
    #[arg(long)]
    strict_paths: bool,
}

/// The invoking user's home directory.
fn home_dir() -> Option<PathBuf> {
    match std::env::var_os("HOME") {
        Some(home) if !home.is_empty() => Some(PathBuf::from(home)),
        _ => User::from_uid(getuid()).ok().flatten().map(|user| user.dir),
    }
}

/// Expand a leading `~` to the home directory.
fn expand_home(path: &Path, home: Option<&Path>) -> PathBuf {
    let Some(home) = home else {
        return path.to_path_buf();
    };
    match path.strip_prefix("~") {
        Ok(rest) => home.join(rest),
        Err(_) => path.to_path_buf(),
    }
}

async fn build_config(args: Args) -> Result<ServerConfig, ServerError> {
    let home = home_dir();
    let mut config = ServerConfig::default();

    let docroot = match args.docroot {
        Some(docroot) => Some(expand_home(&docroot, home.as_deref())),
        None => None,
    };
    if docroot.is_none() {
        let public_html = expand_home(Path::new("~/public_html"), home.as_deref());
        let default_root = if public_html.is_dir() {
            public_html
        } else {
            PathBuf::from(".")
        };
        config.set_root(default_root).await?;
    }

    let mut mime_files = vec![PathBuf::from("/etc/mime.types")];
    if let Some(home) = &home {
        mime_files.push(home.join(".mime.types"));
    }
    for path in mime_files {
        if let Err(e) = config.mime.load_file(&path).await {
            debug!("Skipping mime types: {e}");
        }
    }

    if let Some(path) = args.config {
        ConfigFile::load(expand_home(&path, home.as_deref()))
            .await?
            .apply(&mut config)
            .await?;
    }

    if let Some(docroot) = docroot {
        config.set_root(docroot).await?;
    }
    if args.all {
        config.hide_dotfiles = false;
    }
    if let Some(ip) = args.listen {
        config.addr.set_ip(ip);
    }
    if let Some(port) = args.port {
        config.addr.set_port(port);
    }
    if args.userdirs {
        config.enable_userdirs = true;
    }
    if let Some(suffix) = args.userdir_suffix {
        config.userdir_suffix = suffix;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if args.strict_paths {
        config.strict_paths = true;
    }

    Ok(config)
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stdout)
        .format(|buf, record| match record.level() {
            Level::Info => writeln!(buf, "{}", record.args()),
            level => writeln!(buf, "[{level}] {}", record.args()),
        })
        .init();
}

/// Write the single line a fatal error is reported with.
fn report_fatal(e: &ServerError, out: &mut impl Write) {
    let _ = writeln!(out, "Error: {e}");
}

#[tokio::main]
async fn main() {
    init_logging();
    let args = Args::parse();

    let result = match build_config(args).await {
        Ok(config) => HttpServer::new(config).start().await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        report_fatal(&e, &mut std::io::stderr());
        std::process::exit(1);
    }
}
