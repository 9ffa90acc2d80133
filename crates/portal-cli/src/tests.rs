use super::*;

#[test]
fn parses_db_ping_command() {
    let cli = Cli::try_parse_from(["portal-cli", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn parses_db_migrate_command() {
    let cli =
        Cli::try_parse_from(["portal-cli", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn parses_db_seed_command() {
    let cli = Cli::try_parse_from(["portal-cli", "db", "seed"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Seed
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["portal-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn export_defaults_to_no_output_path() {
    let cli = Cli::try_parse_from(["portal-cli", "export"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Export { out: None })));
}

#[test]
fn export_accepts_output_path() {
    let cli = Cli::try_parse_from(["portal-cli", "export", "--out", "pricing.xlsx"])
        .expect("expected valid cli args");
    match cli.command {
        Some(Commands::Export { out: Some(path) }) => {
            assert_eq!(path, PathBuf::from("pricing.xlsx"));
        }
        other => panic!("unexpected parse: {other:?}"),
    }
}

#[test]
fn unknown_db_command_is_rejected() {
    assert!(Cli::try_parse_from(["portal-cli", "db", "drop"]).is_err());
}
