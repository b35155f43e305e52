use super::*;
use clap::CommandFactory;

#[test]
fn verify_cli_args() {
    // Validates the entire command tree: short flag conflicts,
    // duplicate args, and other clap definition errors.
    Cli::command().debug_assert();
}

#[test]
fn test_analyze_args() {
    let cli = Cli::try_parse_from([
        "vl", "analyze", "a.sql", "dir", "--output", "csv", "-j", "4", "--summary",
    ])
    .unwrap();
    let Commands::Analyze(args) = cli.command else {
        panic!("expected analyze");
    };
    assert_eq!(args.paths, vec!["a.sql", "dir"]);
    assert_eq!(args.output, Some(OutputFormat::Csv));
    assert_eq!(args.jobs, Some(4));
    assert!(args.summary);
    assert!(args.dialect.is_none());
}

#[test]
fn test_analyze_requires_path() {
    assert!(Cli::try_parse_from(["vl", "analyze"]).is_err());
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from(["vl", "inspect", "-", "--verbose", "--config", "x.yml"]).unwrap();
    assert!(cli.global.verbose);
    assert_eq!(cli.global.config.as_deref(), Some(std::path::Path::new("x.yml")));
}
