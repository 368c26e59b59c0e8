use anyhow::{anyhow, Error, Result};
use clap::{Arg, ArgAction, ArgGroup, ArgMatches, Command};
use gitup::{GitLabSourceBuilder, UpdateEntry, UpdateSource};
use log::error;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
enum GitupError {
    #[error("{0:}")]
    InvalidArgsError(String),
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cmd = cmd();
    let matches = cmd.get_matches();
    let res = init_logger_from_matches(&matches);
    if let Err(e) = res {
        eprintln!("Error creating logger: {e}");
        std::process::exit(126);
    }

    let status = match validate_args(&matches) {
        Ok(()) => match run(&matches).await {
            Ok(()) => 0,
            Err(e) => {
                print_err(&e);
                1
            }
        },
        Err(e) => {
            print_err(&e);
            127
        }
    };
    std::process::exit(status);
}

const MAX_TERM_WIDTH: usize = 100;

fn cmd() -> Command {
    Command::new("gitup")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Dave Rolsky <autarch@urth.org>")
        .about("The GitLab releases update feed tool")
        .arg(
            Arg::new("repo")
                .long("repo")
                .short('r')
                .required(true)
                .help(concat!(
                    "The URL of the repository whose releases serve the updates, like",
                    " https://gitlab.com/group/project. Only the URL's path identifies the",
                    " project; requests go to gitlab.com unless --api-base-url is also set.",
                )),
        )
        .arg(Arg::new("token").long("token").short('t').help(concat!(
            "The access token to use for API requests. Needed for private projects. If this",
            " isn't set, the CI_JOB_TOKEN and GITLAB_TOKEN env vars are checked, in that",
            " order.",
        )))
        .arg(
            Arg::new("pre")
                .long("pre")
                .action(ArgAction::SetTrue)
                .help("Include upcoming (prerelease) releases when resolving the feed."),
        )
        .arg(Arg::new("staging-id").long("staging-id").help(concat!(
            "An opaque identifier handed to the manifest parser for staged rollouts. The",
            " default parser records staging percentages but does not filter on them.",
        )))
        .arg(
            Arg::new("download")
                .long("download")
                .short('D')
                .help("The file name of one feed entry to download after resolving the feed."),
        )
        .arg(
            Arg::new("in")
                .long("in")
                .short('i')
                .help("The directory in which the downloaded asset should be placed. Defaults to `.`."),
        )
        .arg(Arg::new("api-base-url").long("api-base-url").help(concat!(
            "The base URL for the releases API. This is useful for testing or for self-hosted",
            " GitLab instances. This should be something like `https://gitlab.my-corp.example.com`.",
        )))
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Enable verbose output."),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .action(ArgAction::SetTrue)
                .help("Enable debugging output."),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .help("Suppresses most output."),
        )
        .group(ArgGroup::new("log-level").args(["verbose", "debug", "quiet"]))
        .max_term_width(MAX_TERM_WIDTH)
}

pub(crate) fn init_logger_from_matches(matches: &ArgMatches) -> Result<(), log::SetLoggerError> {
    let level = if matches.get_flag("debug") {
        log::LevelFilter::Debug
    } else if matches.get_flag("verbose") {
        log::LevelFilter::Info
    } else if matches.get_flag("quiet") {
        log::LevelFilter::Error
    } else {
        log::LevelFilter::Warn
    };

    gitup::init_logger(level)
}

fn validate_args(matches: &ArgMatches) -> Result<()> {
    if matches.contains_id("in") && !matches.contains_id("download") {
        return Err(GitupError::InvalidArgsError(
            "You cannot pass --in without --download".to_string(),
        )
        .into());
    }

    Ok(())
}

async fn run(matches: &ArgMatches) -> Result<()> {
    let mut builder = GitLabSourceBuilder::new();
    // The repo arg is required, so clap guarantees it is present.
    builder = builder.repo_url(matches.get_one::<String>("repo").unwrap());
    if let Some(t) = matches.get_one::<String>("token") {
        builder = builder.token(t);
    }
    if matches.get_flag("pre") {
        builder = builder.include_upcoming();
    }
    if let Some(u) = matches.get_one::<String>("api-base-url") {
        builder = builder.api_base_url(u);
    }
    let mut source = builder.build()?;

    let staging_id = matches.get_one::<String>("staging-id").map(String::as_str);
    let entries = source.resolve_feed(staging_id, None).await?;

    let Some(name) = matches.get_one::<String>("download") else {
        print_feed(&entries);
        return Ok(());
    };

    let entry = entries
        .iter()
        .find(|e| e.file_name.eq_ignore_ascii_case(name))
        .ok_or_else(|| anyhow!("the resolved feed has no entry named `{name}`"))?;

    let mut dest = matches
        .get_one::<String>("in")
        .map_or_else(|| PathBuf::from("."), PathBuf::from);
    dest.push(&entry.file_name);

    let progress = |pct: u8| {
        eprint!("\r{pct:>3}%");
    };
    source.download_asset(entry, &dest, Some(&progress)).await?;
    eprintln!();

    println!("Downloaded {} to {}", entry.file_name, dest.display());
    Ok(())
}

fn print_feed(entries: &[UpdateEntry]) {
    if entries.is_empty() {
        println!("The resolved feed has no entries.");
        return;
    }
    for entry in entries {
        match entry.staging_percentage {
            Some(pct) => println!(
                "{}  {}  {} bytes  (staged at {pct}%)",
                entry.sha1, entry.file_name, entry.file_size
            ),
            None => println!(
                "{}  {}  {} bytes",
                entry.sha1, entry.file_name, entry.file_size
            ),
        }
    }
}

fn print_err(e: &Error) {
    error!("{e}");
    if let Some(ge) = e.downcast_ref::<GitupError>() {
        match ge {
            GitupError::InvalidArgsError(_) => {
                println!();
                cmd().print_help().unwrap();
            }
        }
    }
}
