use crate::CLAP_STYLING;
use clap::arg;
use url::Url;

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("pathscout")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("pathscout")
        .about("Obtain strings from JavaScript code that look like paths.")
        .styles(CLAP_STYLING)
        .after_help("With no input files and no URLs, JavaScript is read from standard input.")
        // Input
        .arg(
            arg!(-i --"input-files" <INPUT_FILE>)
                .required(false)
                .help(
                    "Paths to files storing JavaScript code or HTML documents to be scanned. \
                Directories are expanded; '-' reads standard input.",
                )
                .num_args(1..)
                .action(clap::ArgAction::Append),
        )
        .arg(
            arg!(-u --"urls" <URL>)
                .required(false)
                .help("URLs of JavaScript code or HTML documents to be scanned")
                .value_parser(clap::value_parser!(Url))
                .num_args(1..)
                .action(clap::ArgAction::Append),
        )
        .arg(
            arg!(-r --"recurse")
                .required(false)
                .help("Also scan files in subdirectories of input directories")
                .action(clap::ArgAction::SetTrue),
        )
        // Output
        .arg(
            arg!(-c --"show-context")
                .required(false)
                .help("Output the context for each match rather than the match itself")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            arg!(-a --"all")
                .required(false)
                .help(
                    "Output a list of all unique endpoint candidates without their sources. \
                Always on when reading standard input.",
                )
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            arg!(-j --"json")
                .required(false)
                .help("Output the results in JSON")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            arg!(--"no-color")
                .required(false)
                .help("Never highlight matches or headers")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            arg!(--"skip-comments")
                .required(false)
                .help("Do not look for endpoints inside comments")
                .action(clap::ArgAction::SetTrue),
        )
        // Requests
        .arg(
            arg!(-e --"retrieve-external-scripts")
                .required(false)
                .help("Retrieve scripts referenced by the \"src\" attribute in fetched HTML documents")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            arg!(-t --"timeout" <SECONDS>)
                .required(false)
                .help("The total number of seconds to wait for an HTTP response for a resource")
                .value_parser(clap::value_parser!(u64).range(1..))
                .default_value("10"),
        )
        .arg(
            arg!(-n --"concurrency" <NUM_REQUESTS>)
                .required(false)
                .help("The maximum number of HTTP requests in flight at once")
                .value_parser(clap::value_parser!(usize))
                .default_value("10"),
        )
        .arg(
            arg!(--"cookie" <COOKIE>)
                .required(false)
                .help("Value of the Cookie header sent with every request"),
        )
        .arg(
            arg!(--"user-agent" <USER_AGENT>)
                .required(false)
                .help("User-Agent header sent with every request"),
        )
        .arg(
            arg!(-k --"insecure")
                .required(false)
                .help("Accept invalid TLS certificates")
                .action(clap::ArgAction::SetTrue),
        )
        // Logging
        .arg(
            arg!(-w --"ignore-warnings")
                .required(false)
                .help("Do not output warning messages; only error messages and the results")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            arg!(-q --"quiet")
                .required(false)
                .help("Do not output warning messages or error messages")
                .action(clap::ArgAction::SetTrue),
        )
}
