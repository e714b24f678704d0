use std::fmt;

use learn_core::codec::format_timestamp;
use learn_core::model::{CurriculumId, LessonId};
use learn_core::stats::DEFAULT_LESSONS_PER_CURRICULUM;
use services::{AppServices, Clock, StaticCatalog};
use tracing::info;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArg { name: &'static str },
    UnknownArg(String),
    InvalidId { name: &'static str, raw: String },
    InvalidLessons { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArg { name } => write!(f, "missing <{name}>"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidId { name, raw } => write!(f, "invalid {name}: {raw}"),
            ArgsError::InvalidLessons { raw } => write!(f, "invalid --lessons value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- mark   <curriculum> <lesson> [options]");
    eprintln!("  cargo run -p app -- status <curriculum>          [options]");
    eprintln!("  cargo run -p app -- stats                        [options]");
    eprintln!("  cargo run -p app -- reset                        [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>      default: sqlite:dev.sqlite3 (relative to the working directory)");
    eprintln!("  --lessons <n>          lessons per curriculum, default: {DEFAULT_LESSONS_PER_CURRICULUM}");
    eprintln!("  --enrolled <id,id,..>  enrolled curricula, default: none");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LEARN_DB_URL, LEARN_LESSONS_PER_CURRICULUM, LEARN_ENROLLED, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Mark(CurriculumId, LessonId),
    Status(CurriculumId),
    Stats,
    Reset,
}

struct Args {
    db_url: String,
    lessons: u32,
    enrolled: Vec<CurriculumId>,
}

impl Args {
    fn from_env() -> Self {
        let db_url = std::env::var("LEARN_DB_URL")
            .ok()
            .map_or_else(default_db_url, normalize_sqlite_url);
        let lessons = std::env::var("LEARN_LESSONS_PER_CURRICULUM")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(DEFAULT_LESSONS_PER_CURRICULUM);
        let enrolled = std::env::var("LEARN_ENROLLED")
            .ok()
            .and_then(|value| parse_id_list(&value).ok())
            .unwrap_or_default();

        Self {
            db_url,
            lessons,
            enrolled,
        }
    }

    fn parse_options(mut self, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    self.db_url = normalize_sqlite_url(value);
                }
                "--lessons" => {
                    let value = require_value(args, "--lessons")?;
                    self.lessons = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidLessons { raw: value.clone() })?;
                }
                "--enrolled" => {
                    let value = require_value(args, "--enrolled")?;
                    self.enrolled = parse_id_list(&value)?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }
        Ok(self)
    }
}

fn parse_id_list(raw: &str) -> Result<Vec<CurriculumId>, ArgsError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<CurriculumId>().map_err(|_| ArgsError::InvalidId {
                name: "curriculum",
                raw: part.to_string(),
            })
        })
        .collect()
}

fn positional<T: std::str::FromStr>(
    args: &mut impl Iterator<Item = String>,
    name: &'static str,
) -> Result<T, ArgsError> {
    let raw = args.next().ok_or(ArgsError::MissingArg { name })?;
    raw.parse::<T>()
        .map_err(|_| ArgsError::InvalidId { name, raw })
}

fn parse_command(args: &mut impl Iterator<Item = String>) -> Result<Command, ArgsError> {
    let Some(first) = args.next() else {
        return Ok(Command::Stats);
    };
    match first.as_str() {
        "mark" => Ok(Command::Mark(
            positional(args, "curriculum")?,
            positional(args, "lesson")?,
        )),
        "status" => Ok(Command::Status(positional(args, "curriculum")?)),
        "stats" => Ok(Command::Stats),
        "reset" => Ok(Command::Reset),
        _ => Err(ArgsError::UnknownArg(first)),
    }
}

fn default_db_url() -> String {
    normalize_sqlite_url("sqlite:dev.sqlite3".into())
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    if matches!(argv.first().map(String::as_str), Some("--help" | "-h")) {
        print_usage();
        return Ok(());
    }

    let mut iter = argv.into_iter().peekable();
    let cmd = if iter.peek().is_some_and(|arg| arg.starts_with("--")) {
        Command::Stats
    } else {
        parse_command(&mut iter).inspect_err(|e| {
            eprintln!("{e}");
            print_usage();
        })?
    };
    let parsed = Args::from_env().parse_options(&mut iter).inspect_err(|e| {
        eprintln!("{e}");
        print_usage();
    })?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let catalog = StaticCatalog::new(parsed.lessons, parsed.enrolled);
    let services = AppServices::new_sqlite(&parsed.db_url, Clock::default_clock(), catalog).await?;
    info!(db = %parsed.db_url, ?cmd, "progress services ready");

    let progress = services.progress();
    match cmd {
        Command::Mark(curriculum_id, lesson_id) => {
            let record = progress.mark_completed(curriculum_id, lesson_id).await?;
            println!(
                "curriculum {curriculum_id} lesson {lesson_id} completed at {}",
                format_timestamp(record.completed_at())
            );
        }
        Command::Status(curriculum_id) => {
            let summary = services.stats().curriculum_summary(curriculum_id);
            println!(
                "curriculum {curriculum_id}: {} of {} lessons completed ({:.0}%)",
                summary.completed, summary.total, summary.percentage
            );
            for (lesson_id, record) in progress.curriculum_progress(curriculum_id).lessons() {
                println!(
                    "  lesson {:>3}  {}",
                    lesson_id.value(),
                    format_timestamp(record.completed_at())
                );
            }
            match summary.next_lesson {
                Some(next) => println!("next lesson: {next}"),
                None if summary.is_complete() => println!("curriculum complete"),
                None => {}
            }
        }
        Command::Stats => {
            let overview = services.stats().overview();
            let stats = &overview.stats;
            println!("lessons completed:  {}", stats.completed_lessons);
            println!("enrolled curricula: {}", stats.enrolled_curricula);
            println!("average completion: {:.0}%", stats.average_completion);
            println!("day streak:         {}", stats.streak);
            for summary in &overview.curricula {
                println!(
                    "  curriculum {:>4}  {:>3}/{:<3} {:>3.0}%",
                    summary.curriculum_id.value(),
                    summary.completed,
                    summary.total,
                    summary.percentage
                );
            }
            for achievement in &overview.achievements {
                println!(
                    "  [unlocked] {}: {}",
                    achievement.title(),
                    achievement.description()
                );
            }
        }
        Command::Reset => {
            progress.reset().await?;
            println!("progress reset");
        }
    }

    Ok(())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> std::vec::IntoIter<String> {
        list.iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn parses_mark_command() {
        let cmd = parse_command(&mut args(&["mark", "2", "14"])).unwrap();
        assert_eq!(cmd, Command::Mark(CurriculumId::new(2), LessonId::new(14)));
    }

    #[test]
    fn mark_requires_both_ids() {
        let err = parse_command(&mut args(&["mark", "2"])).unwrap_err();
        assert!(matches!(err, ArgsError::MissingArg { name: "lesson" }));

        let err = parse_command(&mut args(&["status", "two"])).unwrap_err();
        assert!(matches!(err, ArgsError::InvalidId { name: "curriculum", .. }));
    }

    #[test]
    fn parses_enrolled_list() {
        let ids = parse_id_list("1, 3,,7").unwrap();
        assert_eq!(
            ids,
            vec![CurriculumId::new(1), CurriculumId::new(3), CurriculumId::new(7)]
        );
        assert!(parse_id_list("1,x").is_err());
    }

    #[test]
    fn options_override_defaults() {
        let base = Args {
            db_url: "sqlite::memory:".into(),
            lessons: DEFAULT_LESSONS_PER_CURRICULUM,
            enrolled: Vec::new(),
        };
        let parsed = base
            .parse_options(&mut args(&["--lessons", "10", "--enrolled", "4"]))
            .unwrap();
        assert_eq!(parsed.lessons, 10);
        assert_eq!(parsed.enrolled, vec![CurriculumId::new(4)]);
        assert_eq!(parsed.db_url, "sqlite::memory:");
    }

    #[test]
    fn normalizes_relative_paths() {
        let url = normalize_sqlite_url("sqlite:data/progress.sqlite3".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/progress.sqlite3"));
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
    }

    #[test]
    fn default_db_url_is_absolute() {
        let url = default_db_url();
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("/dev.sqlite3"));
        assert_eq!(normalize_sqlite_url(url.clone()), url);
    }
}
