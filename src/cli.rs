use backcheck_library::check::KeyFields;
use backcheck_storage::ScanOptions;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Verify that every file in a copy tree exists, by content, in a source tree.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON). Defaults to `config.toml` in
    /// the platform configuration directory.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Scan as usual but never write cache artifacts.
    #[arg(long, global = true)]
    pub dry_run: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build the cache for one or more directory trees.
    Build {
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<PathBuf>,
        #[command(flatten)]
        scan: ScanArgs,
        /// Scan subdirectories down to this depth first, deepest first.
        #[arg(long, default_value_t = 0, value_name = "DEPTH")]
        dig: usize,
    },
    /// Detect content of COPY that is missing in SOURCE.
    Check {
        copy: PathBuf,
        source: PathBuf,
        #[command(flatten)]
        scan: ScanArgs,
        #[command(flatten)]
        key: KeyArgs,
    },
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Rescan even if cached, reusing every already known hash.
    #[arg(short, long)]
    pub incremental: bool,
    /// Skip files and directories that cannot be read instead of aborting.
    #[arg(long)]
    pub no_fail: bool,
}

#[derive(Debug, Args)]
pub struct KeyArgs {
    /// Do not compare file contents (and do not hash them).
    #[arg(long)]
    pub no_hash: bool,
    /// Do not compare file names.
    #[arg(long)]
    pub no_name: bool,
    /// Do not compare creation times.
    #[arg(long)]
    pub no_create: bool,
    /// Do not compare status change times.
    #[arg(long)]
    pub no_change: bool,
    /// Do not compare modification times.
    #[arg(long)]
    pub no_modify: bool,
    /// Do not compare any timestamp; same as all three above.
    #[arg(long)]
    pub no_date: bool,
}

impl ScanArgs {
    pub fn options(&self) -> ScanOptions {
        ScanOptions {
            with_hash: true,
            is_incremental: self.incremental,
            continue_on_failure: self.no_fail,
        }
    }
}

impl KeyArgs {
    pub fn fields(&self) -> KeyFields {
        KeyFields {
            hash: !self.no_hash,
            name: !self.no_name,
            created: !(self.no_create || self.no_date),
            changed: !(self.no_change || self.no_date),
            modified: !(self.no_modify || self.no_date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("backcheck").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_build() {
        let cli = parse(&["--dry-run", "build", "/a", "/b", "-i", "--no-fail", "--dig", "2"]);
        assert!(cli.dry_run);
        let Command::Build { paths, scan, dig } = cli.command else { panic!("expected build") };
        assert_eq!(paths, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
        assert_eq!(dig, 2);
        assert_eq!(scan.options(), ScanOptions { with_hash: true, is_incremental: true, continue_on_failure: true });
    }

    #[test]
    fn test_build_requires_a_path() {
        assert!(Cli::try_parse_from(["backcheck", "build"]).is_err());
    }

    #[test]
    fn test_check_defaults() {
        let cli = parse(&["check", "/copy", "/source"]);
        assert_eq!(cli.config, None);
        let Command::Check { copy, source, scan, key } = cli.command else { panic!("expected check") };
        assert_eq!((copy, source), (PathBuf::from("/copy"), PathBuf::from("/source")));
        assert_eq!(scan.options(), ScanOptions::default());
        assert_eq!(key.fields(), KeyFields::default());
    }

    #[rstest]
    #[case(&["--no-hash"], KeyFields { hash: false, ..KeyFields::default() })]
    #[case(&["--no-name", "--no-modify"], KeyFields { name: false, modified: false, ..KeyFields::default() })]
    #[case(&["--no-create", "--no-change"], KeyFields { created: false, changed: false, ..KeyFields::default() })]
    #[case(&["--no-date"], KeyFields::default().without_dates())]
    fn test_check_key_flags(#[case] flags: &[&str], #[case] expected: KeyFields) {
        let mut args = vec!["check", "/copy", "/source"];
        args.extend_from_slice(flags);
        let Command::Check { key, .. } = parse(&args).command else { panic!("expected check") };
        assert_eq!(key.fields(), expected);
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = parse(&["check", "/copy", "/source", "--config", "/etc/backcheck.yaml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/backcheck.yaml")));
    }
}
