//! Command line tool to classify articles with the trained model

use std::{
    io::{self, BufRead},
    path::PathBuf,
};

use anyhow::Result;
use fake_news_classifier::{
    config::{ArtifactPaths, Config},
    pipelines::text_classification::infer,
    utils::logging,
};
use pico_args::Arguments;

const HELP: &str = "\
Usage: infer [OPTIONS] [TEXT]...

Classifies each TEXT argument, or each line of standard input when none
are given, as REAL or FAKE.

Options:
  -h, --help               Print help
  -c, --config PATH        YAML configuration file (or set FAKE_NEWS_CONFIG)
  -o, --artifact-dir DIR   Directory holding the artifact pair
  --json                   Print one JSON object per input
";

#[derive(Debug)]
struct Args {
    /// Prints the usage menu
    help: bool,

    /// Configuration file
    config: Option<PathBuf>,

    /// Overrides the configured artifact locations
    artifact_dir: Option<PathBuf>,

    /// Emit JSON lines instead of text
    json: bool,

    /// Documents to classify
    texts: Vec<String>,
}

fn parse_args() -> Result<Args, pico_args::Error> {
    let mut pargs = Arguments::from_env();

    let help = pargs.contains(["-h", "--help"]);
    let config = pargs.opt_value_from_str(["-c", "--config"])?;
    let artifact_dir = pargs.opt_value_from_str(["-o", "--artifact-dir"])?;
    let json = pargs.contains("--json");

    let texts = pargs
        .finish()
        .into_iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();

    Ok(Args {
        help,
        config,
        artifact_dir,
        json,
        texts,
    })
}

fn main() -> Result<()> {
    logging::init();

    let args = parse_args()?;

    if args.help {
        println!("{}", HELP);
        return Ok(());
    }

    let config = Config::resolve(args.config)?;
    let artifacts = match args.artifact_dir {
        Some(dir) => ArtifactPaths::in_dir(dir),
        None => config.artifacts,
    };

    let texts = if args.texts.is_empty() {
        io::stdin()
            .lock()
            .lines()
            .filter(|line| !matches!(line, Ok(l) if l.trim().is_empty()))
            .collect::<io::Result<Vec<_>>>()?
    } else {
        args.texts
    };

    let predictions = infer(&artifacts, &texts)?;

    for (text, prediction) in texts.iter().zip(&predictions) {
        if args.json {
            println!(
                "{}",
                serde_json::json!({
                    "text": text,
                    "label": prediction.label,
                    "isFake": prediction.is_fake(),
                    "real": prediction.real,
                    "fake": prediction.fake,
                })
            );
        } else {
            println!(
                "{}\t(real {:.4}, fake {:.4})\t{}",
                prediction.label, prediction.real, prediction.fake, text
            );
        }
    }

    Ok(())
}
