//! HTTP service answering `POST /predict` with the trained model

use std::{path::PathBuf, sync::Arc};

use anyhow::anyhow;
use fake_news_classifier::{
    config::{ArtifactPaths, Config},
    pipelines::text_classification::Predictor,
    server::{self, AppState},
    utils::logging,
};
use pico_args::Arguments;
use tokio::net::TcpListener;

const HELP: &str = "\
Usage: serve [OPTIONS]

Loads the artifact pair once and serves predictions over HTTP.

Options:
  -h, --help               Print help
  -c, --config PATH        YAML configuration file (or set FAKE_NEWS_CONFIG)
  -o, --artifact-dir DIR   Directory holding the artifact pair
  --host HOST              Address to bind (defaults to 127.0.0.1)
  -p, --port PORT          Port to bind (defaults to 5002)
";

#[derive(Debug)]
struct Args {
    config: Option<PathBuf>,
    artifact_dir: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
}

impl Args {
    fn parse() -> anyhow::Result<Option<Self>> {
        let mut pargs = Arguments::from_env();

        // Help has a higher priority and should be handled separately.
        if pargs.contains(["-h", "--help"]) {
            return Ok(None);
        }

        let args = Args {
            config: pargs.opt_value_from_str(["-c", "--config"])?,
            artifact_dir: pargs.opt_value_from_str(["-o", "--artifact-dir"])?,
            host: pargs.opt_value_from_str("--host")?,
            port: pargs.opt_value_from_str(["-p", "--port"])?,
        };

        let remaining = pargs.finish();
        if !remaining.is_empty() {
            return Err(anyhow!("Unexpected arguments: {:?}", remaining));
        }

        Ok(Some(args))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let Some(args) = Args::parse()? else {
        print!("{}", HELP);

        return Ok(());
    };

    let mut config = Config::resolve(args.config)?;
    if let Some(dir) = args.artifact_dir {
        config.artifacts = ArtifactPaths::in_dir(dir);
    }
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    // Refuse to start without a usable model
    let predictor = Predictor::load(&config.artifacts)
        .map_err(|e| anyhow!("Unable to load trained model: {}", e))?;
    log::info!(
        "Loaded model with {} features",
        predictor.vectorizer().dim()
    );

    let addr = config.server.listen_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow!("Unable to bind {}: {}", addr, e))?;
    log::info!("Listening on http://{}", addr);

    server::serve(listener, Arc::new(AppState::new(predictor))).await?;

    log::info!("Server stopped");

    Ok(())
}
