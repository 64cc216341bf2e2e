//! Section View - Entry Point

use clap::Parser;
use section_view::model::AppError;
use section_view::view::ViewMode;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

/// Replay a board script through the thread section views and print the
/// resulting document outline
#[derive(Parser, Debug)]
#[command(name = "section-view")]
#[command(version)]
#[command(about = "Replay thread events against section views and print the document outline")]
pub struct Args {
    /// Path to the JSON replay script
    pub script: PathBuf,

    /// Replies kept per thread on board pages (zero or negative hides all)
    #[arg(short, long, allow_negative_numbers = true)]
    pub limit: Option<i64>,

    /// Page kind the views live on
    #[arg(short, long, value_enum)]
    pub mode: Option<ViewMode>,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), AppError> {
    // Defaults → Config File → Env Vars → CLI Args
    let config = {
        let config_file = section_view::config::load_config_with_precedence(args.config.clone())?;
        let merged = section_view::config::merge_config(config_file);
        let with_env = section_view::config::apply_env_overrides(merged)?;
        section_view::config::apply_cli_overrides(with_env, args.limit, args.mode)
    };

    section_view::logging::init(&config.log_file_path)?;

    info!(config = ?config, "Configuration loaded and resolved");

    let script = section_view::replay::load_script(&args.script)?;
    let outline = section_view::replay::run(&script, &config)?;
    println!("{outline}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_help_does_not_error() {
        let result = Args::try_parse_from(["section-view", "--help"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_version_does_not_error() {
        let result = Args::try_parse_from(["section-view", "--version"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_script_is_required() {
        let result = Args::try_parse_from(["section-view"]);
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn test_no_flags_defaults() {
        let args = Args::try_parse_from(["section-view", "board.json"]).unwrap();
        assert_eq!(args.script, PathBuf::from("board.json"));
        assert_eq!(args.limit, None);
        assert_eq!(args.mode, None);
        assert_eq!(args.config, None);
    }

    #[test]
    fn test_negative_limit_is_accepted() {
        let args = Args::try_parse_from(["section-view", "--limit", "-1", "board.json"]).unwrap();
        assert_eq!(args.limit, Some(-1));
    }

    #[test]
    fn test_mode_flag() {
        let args =
            Args::try_parse_from(["section-view", "-m", "thread", "board.json"]).unwrap();
        assert_eq!(args.mode, Some(ViewMode::Thread));

        let result = Args::try_parse_from(["section-view", "--mode", "catalog", "board.json"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_flag() {
        let args = Args::try_parse_from([
            "section-view",
            "--config",
            "/tmp/section-view.toml",
            "board.json",
        ])
        .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/tmp/section-view.toml")));
    }
}
