//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Results and errors only
//! - `--config <path>`: Read and write this config file

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::xcode::build::{Arch, DEFAULT_BUILD_PATH};
use crate::xcode::package::{DEFAULT_APP_DIR, DEFAULT_OUTPUT_DIR};

/// Jarvis - a personal command-line assistant
#[derive(Parser, Debug)]
#[command(name = "jarvis")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Print results and errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file to use instead of the standard locations
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check that jarvis is alive
    Ping,

    /// Generate shell completion scripts
    #[command(after_help = "\
EXAMPLES:
    # Bash (add to ~/.bashrc)
    source <(jarvis completion bash)

    # Zsh
    jarvis completion zsh > \"${fpath[1]}/_jarvis\"")]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Get, set, or list configuration values
    #[command(
        long_about = "Get, set, or list configuration values.\n\n\
            Configuration lives in a TOML file, by default ~/.jarvis/config.toml. \
            Command-line flags always take precedence over the file.",
        after_help = "\
KEYS:
    panel.host        Panel base URL (default http://127.0.0.1:8888)
    panel.key         Panel API key
    mysql.host        Local MySQL host (default 127.0.0.1)
    mysql.port        Local MySQL port (default 3306)
    mysql.username    Local MySQL user (default root)
    mysql.password    Local MySQL password (default root)

EXAMPLES:
    jarvis config set panel.host https://panel.example.com:8888
    jarvis config set panel.key          # prompts without echo
    jarvis config list"
    )]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Hosting panel API
    #[command(
        long_about = "Hosting panel API.\n\n\
            Every request is a signed form POST: the panel key never leaves this \
            machine, only a timestamp and a token derived from it. Requests time \
            out after 20 seconds.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Store the panel address and key once
    jarvis config set panel.host http://10.0.0.2:8888
    jarvis config set panel.key

    # Create a site and replace its nginx config
    jarvis bt site create --domain example.com
    jarvis bt site conf --name example.com --file ./example.conf

    # Raw request against any endpoint
    jarvis bt http --query '/system?action=GetSystemTotal'"
    )]
    Bt(BtArgs),

    /// Local MySQL administration
    Database(DatabaseArgs),

    /// Host information and resource reports
    System {
        #[command(subcommand)]
        action: SystemAction,
    },

    /// macOS app release toolchain
    #[command(
        long_about = "macOS app release toolchain.\n\n\
            Commands follow the release pipeline: setup, version, build, codesign, \
            package. Each step prints where it sits in the pipeline and what to \
            run next. Run them from the directory holding the .xcodeproj or \
            .xcworkspace.",
        after_help = "\
WORKFLOW EXAMPLES:
    jarvis xcode setup --all
    jarvis xcode bump
    jarvis xcode build -s MyApp
    jarvis xcode codesign -s MyApp -i \"Developer ID Application: Me (TEAMID)\"
    jarvis xcode package -s MyApp"
    )]
    Xcode {
        #[command(subcommand)]
        action: XcodeAction,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Value to set (prompted without echo when omitted)
        value: Option<String>,
    },
    /// List all configuration values
    List,
    /// Print the config file path
    Path,
}

/// Panel connection flags.
#[derive(Args, Debug)]
pub struct BtArgs {
    /// Panel base URL
    #[arg(short = 's', long, global = true)]
    pub host: Option<String>,

    /// Panel API key
    #[arg(short, long, global = true)]
    pub key: Option<String>,

    #[command(subcommand)]
    pub action: BtAction,
}

/// Panel subcommands
#[derive(Subcommand, Debug)]
pub enum BtAction {
    /// Signed POST to any panel endpoint
    Http {
        /// Endpoint path and query, e.g. /system?action=GetSystemTotal
        #[arg(long)]
        query: String,

        /// Extra form fields as a urlencoded string, e.g. 'a=1&b=2'
        #[arg(long)]
        data: Option<String>,
    },

    /// Manage sites
    Site {
        #[command(subcommand)]
        action: SiteAction,
    },

    /// Manage scheduled tasks
    Crontab {
        #[command(subcommand)]
        action: CrontabAction,
    },

    /// Manage panel databases
    Database {
        #[command(subcommand)]
        action: BtDatabaseAction,
    },
}

/// Site subcommands
#[derive(Subcommand, Debug)]
pub enum SiteAction {
    /// List sites
    Show,

    /// List site categories
    Types,

    /// List installed PHP versions
    Php,

    /// Create a PHP site
    Create {
        /// Primary domain
        #[arg(long)]
        domain: String,

        /// Web root (default /www/wwwroot/<domain>)
        #[arg(long)]
        path: Option<String>,

        /// PHP version without dots
        #[arg(long, default_value = "80")]
        php: String,

        /// Listen port
        #[arg(long, default_value_t = 80)]
        port: u16,

        /// Note (default: the domain)
        #[arg(long)]
        ps: Option<String>,

        /// Site category id
        #[arg(long, default_value_t = 0)]
        type_id: u32,
    },

    /// Delete a site by name
    Delete {
        /// Site name as listed by `site show`
        #[arg(long)]
        name: String,
    },

    /// Replace a site's nginx configuration
    #[command(after_help = "\
One of --file or --content is required; --file wins when both are given.")]
    Conf {
        /// Site name
        #[arg(long)]
        name: String,

        /// Read the configuration from this file
        #[arg(long)]
        file: Option<PathBuf>,

        /// Configuration text
        #[arg(long)]
        content: Option<String>,
    },
}

/// Crontab subcommands
#[derive(Subcommand, Debug)]
pub enum CrontabAction {
    /// List scheduled tasks
    Get,

    /// Create a shell task run every minute
    Create {
        /// Task name
        #[arg(long)]
        name: String,

        /// Shell script body
        #[arg(long)]
        shell: String,
    },

    /// Delete a task by name
    Delete {
        /// Task name
        #[arg(long)]
        name: String,
    },
}

/// Panel database subcommands
#[derive(Subcommand, Debug)]
pub enum BtDatabaseAction {
    /// List databases
    Show,

    /// Create a MySQL database
    Create {
        /// Database name
        #[arg(long)]
        name: String,

        /// Database user password
        #[arg(long)]
        password: String,

        /// Database user (default: the database name)
        #[arg(long)]
        user: Option<String>,

        /// Allowed client address
        #[arg(long, default_value = "127.0.0.1")]
        access: String,

        /// Note (default: the database name)
        #[arg(long)]
        ps: Option<String>,
    },
}

/// Local MySQL connection flags.
#[derive(Args, Debug)]
pub struct DatabaseArgs {
    /// Server host
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// User name
    #[arg(short, long, global = true)]
    pub username: Option<String>,

    /// Password
    #[arg(short, long, global = true)]
    pub password: Option<String>,

    #[command(subcommand)]
    pub action: DatabaseAction,
}

/// Local MySQL subcommands
#[derive(Subcommand, Debug)]
pub enum DatabaseAction {
    /// List databases
    Show,

    /// Create a database if it does not exist
    Create {
        /// Database name (letters, digits, '_' or '$')
        #[arg(long)]
        name: String,
    },
}

/// System subcommands
#[derive(Subcommand, Debug)]
pub enum SystemAction {
    /// Operating system, hardware and environment
    Info {
        /// Show details
        #[arg(short, long)]
        verbose: bool,
    },

    /// CPU, memory, disk and load
    Resource {
        /// Show details
        #[arg(short, long)]
        verbose: bool,

        /// Refresh until interrupted
        #[arg(short, long)]
        watch: bool,

        /// Seconds between refreshes in watch mode
        #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u64).range(1..))]
        interval: u64,
    },

    /// Running processes
    #[command(after_help = "\
SORT KEYS:
    cpu (default), memory|mem, pid, name

EXAMPLES:
    jarvis system process -t 5 -s mem
    jarvis system process -f chrome -t 0")]
    Process {
        /// Rows to show; 0 shows all
        #[arg(short, long, default_value_t = 10)]
        top: usize,

        /// Sort key
        #[arg(short, long, default_value = "cpu")]
        sort: String,

        /// Only processes whose name or command contains this text
        #[arg(short, long)]
        filter: Option<String>,

        /// Show details
        #[arg(short, long)]
        verbose: bool,
    },

    /// Interfaces, connections and protocol statistics
    Network {
        /// Show details
        #[arg(short, long)]
        verbose: bool,

        /// Show connection counts
        #[arg(short, long)]
        connections: bool,

        /// Show protocol statistics
        #[arg(short, long)]
        stats: bool,
    },

    /// Disk usage, inodes and I/O
    Disk {
        /// Show details
        #[arg(short, long)]
        verbose: bool,

        /// Show I/O statistics
        #[arg(long)]
        io: bool,

        /// Show inode usage
        #[arg(long)]
        inodes: bool,
    },
}

/// Xcode subcommands
#[derive(Subcommand, Debug)]
pub enum XcodeAction {
    /// Installed Xcode, tools and SDKs
    Info {
        /// Show details
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show the marketing version
    Version {
        /// Path to project.pbxproj (searched below the current directory)
        #[arg(short, long)]
        project: Option<PathBuf>,
    },

    /// Increment the patch version
    Bump {
        /// Path to project.pbxproj (searched below the current directory)
        #[arg(short, long)]
        project: Option<PathBuf>,

        /// Show the new version without writing it
        #[arg(long)]
        dry_run: bool,
    },

    /// Release build with xcodebuild
    #[command(after_help = "\
EXAMPLES:
    jarvis xcode build                  # first scheme, universal binary
    jarvis xcode build -s MyApp -a arm64
    jarvis xcode build --no-clean -v")]
    Build {
        /// Scheme (default: first scheme of the project)
        #[arg(short, long)]
        scheme: Option<String>,

        /// Derived data directory
        #[arg(short, long, default_value = DEFAULT_BUILD_PATH)]
        build_path: PathBuf,

        /// Target architecture
        #[arg(short, long, value_enum, default_value_t = ArchArg::Universal)]
        arch: ArchArg,

        /// Show xcodebuild output
        #[arg(short, long)]
        verbose: bool,

        /// Skip the clean step
        #[arg(long)]
        no_clean: bool,
    },

    /// Sign the built app
    Codesign {
        /// Scheme (default: first scheme of the project)
        #[arg(short, long)]
        scheme: Option<String>,

        /// Derived data directory or products directory
        #[arg(short, long, default_value = DEFAULT_BUILD_PATH)]
        build_path: PathBuf,

        /// Signing identity; omit to list the available ones
        #[arg(short, long)]
        identity: Option<String>,

        /// Pass --verbose to codesign
        #[arg(short, long)]
        verbose: bool,
    },

    /// Wrap the app in a DMG
    Package {
        /// Scheme (default: first scheme of the project)
        #[arg(short, long)]
        scheme: Option<String>,

        /// Directory holding <scheme>.app
        #[arg(short, long, default_value = DEFAULT_APP_DIR)]
        build_path: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
        output: PathBuf,

        /// DMG file name
        #[arg(short, long)]
        name: Option<String>,

        /// Leave the architecture out of the file name
        #[arg(long)]
        no_arch: bool,

        /// Show details
        #[arg(short, long)]
        verbose: bool,

        /// Use create-dmg when installed
        #[arg(long)]
        use_create_dmg: bool,
    },

    /// Check the signing environment
    Setup {
        /// Show signing certificates
        #[arg(long)]
        show_certificates: bool,

        /// Show keychain information
        #[arg(long)]
        show_keychain: bool,

        /// Show provisioning profiles
        #[arg(long)]
        show_profiles: bool,

        /// Show everything
        #[arg(long)]
        all: bool,

        /// Show details
        #[arg(short, long)]
        verbose: bool,
    },
}

/// Build architecture
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchArg {
    /// x86_64 and arm64
    Universal,
    /// Intel only
    #[value(name = "x86_64")]
    X86_64,
    /// Apple silicon only
    Arm64,
}

impl From<ArchArg> for Arch {
    fn from(arg: ArchArg) -> Self {
        match arg {
            ArchArg::Universal => Arch::Universal,
            ArchArg::X86_64 => Arch::X86_64,
            ArchArg::Arm64 => Arch::Arm64,
        }
    }
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn bt_flags_are_global_within_bt() {
        let cli = Cli::try_parse_from([
            "jarvis", "bt", "site", "delete", "--name", "a.com", "-k", "K", "-s", "http://h",
        ])
        .unwrap();
        match cli.command {
            Command::Bt(bt) => {
                assert_eq!(bt.key.as_deref(), Some("K"));
                assert_eq!(bt.host.as_deref(), Some("http://h"));
                assert!(matches!(bt.action, BtAction::Site { action: SiteAction::Delete { .. } }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn site_create_defaults() {
        let cli = Cli::try_parse_from(["jarvis", "bt", "site", "create", "--domain", "a.com"])
            .unwrap();
        let Command::Bt(bt) = cli.command else {
            panic!("not bt");
        };
        match bt.action {
            BtAction::Site {
                action: SiteAction::Create { php, port, type_id, path, .. },
            } => {
                assert_eq!(php, "80");
                assert_eq!(port, 80);
                assert_eq!(type_id, 0);
                assert!(path.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn xcode_build_defaults() {
        let cli = Cli::try_parse_from(["jarvis", "xcode", "build", "-a", "x86_64"]).unwrap();
        match cli.command {
            Command::Xcode {
                action: XcodeAction::Build { arch, build_path, no_clean, .. },
            } => {
                assert_eq!(arch, ArchArg::X86_64);
                assert_eq!(build_path, PathBuf::from("./temp"));
                assert!(!no_clean);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn process_defaults() {
        let cli = Cli::try_parse_from(["jarvis", "system", "process"]).unwrap();
        match cli.command {
            Command::System {
                action: SystemAction::Process { top, sort, filter, .. },
            } => {
                assert_eq!(top, 10);
                assert_eq!(sort, "cpu");
                assert!(filter.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn watch_interval_must_be_positive() {
        assert!(Cli::try_parse_from(["jarvis", "system", "resource", "-w", "--interval", "0"])
            .is_err());
    }
}
