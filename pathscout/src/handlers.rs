use clap::ArgMatches;
use pathscout_core::crawl::CrawlOptions;
use pathscout_core::report::{DisplayMode, render_all_json, render_all_text, render_json, render_text};
use pathscout_scanner::crawler::STDIN_PATH;
use pathscout_scanner::{CrawlState, ScanOptions};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::Level;
use url::Url;

/// Everything the binary needs from the command line.
#[derive(Debug, Clone)]
pub struct CliSettings {
    pub crawl: CrawlOptions,
    pub json: bool,
    /// Print the distinct matches across all labels instead of per-label
    /// sections
    pub all: bool,
    pub display_mode: DisplayMode,
    /// Highlight matches and section headers
    pub color: bool,
    /// `None` disables logging entirely
    pub log_level: Option<Level>,
}

/// Expand `~` in input paths. `-` (standard input) is passed through.
pub fn expand_input_files<'a>(raw: impl IntoIterator<Item = &'a String>) -> Vec<PathBuf> {
    raw.into_iter()
        .map(|path| PathBuf::from(shellexpand::tilde(path).as_ref()))
        .collect()
}

/// Warnings and errors by default, errors only with `ignore_warnings`,
/// nothing at all with `quiet`.
pub fn log_level(quiet: bool, ignore_warnings: bool) -> Option<Level> {
    if quiet {
        None
    } else if ignore_warnings {
        Some(Level::ERROR)
    } else {
        Some(Level::WARN)
    }
}

pub fn settings_from_matches(matches: &ArgMatches) -> CliSettings {
    let mut files = matches
        .get_many::<String>("input-files")
        .map(expand_input_files)
        .unwrap_or_default();
    let urls: Vec<String> = matches
        .get_many::<Url>("urls")
        .map(|urls| urls.map(|url| url.as_str().to_string()).collect())
        .unwrap_or_default();

    let read_from_stdin = files.is_empty() && urls.is_empty();
    if read_from_stdin {
        files.push(PathBuf::from(STDIN_PATH));
    }

    let json = matches.get_flag("json");
    let quiet = matches.get_flag("quiet");
    // Escape sequences never go into JSON.
    let color = !json && !matches.get_flag("no-color");

    let crawl = CrawlOptions {
        files,
        urls,
        recurse: matches.get_flag("recurse"),
        retrieve_external_scripts: matches.get_flag("retrieve-external-scripts"),
        timeout_secs: *matches.get_one::<u64>("timeout").unwrap_or(&10),
        concurrency: *matches.get_one::<usize>("concurrency").unwrap_or(&10),
        scan: ScanOptions {
            color_context: color,
            scan_comments: !matches.get_flag("skip-comments"),
        },
        user_agent: matches.get_one::<String>("user-agent").cloned(),
        cookie: matches.get_one::<String>("cookie").cloned(),
        insecure: matches.get_flag("insecure"),
        show_progress_bars: !quiet && std::io::stderr().is_terminal(),
    };

    CliSettings {
        crawl,
        json,
        all: matches.get_flag("all") || read_from_stdin,
        display_mode: DisplayMode::from_show_context(matches.get_flag("show-context")),
        color,
        log_level: log_level(quiet, matches.get_flag("ignore-warnings")),
    }
}

/// Install the stderr log subscriber, or nothing when logging is off.
pub fn init_logging(level: Option<Level>) {
    let Some(level) = level else {
        return;
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// The results as they should be printed to standard output.
pub fn render_output(state: &CrawlState, settings: &CliSettings) -> anyhow::Result<String> {
    if settings.all {
        return if settings.json {
            Ok(render_all_json(state.entries(), settings.display_mode)?)
        } else {
            Ok(render_all_text(state.entries(), settings.display_mode))
        };
    }

    if settings.json {
        Ok(render_json(state.entries(), settings.display_mode)?)
    } else {
        Ok(render_text(
            state.entries(),
            settings.display_mode,
            settings.color,
        ))
    }
}
