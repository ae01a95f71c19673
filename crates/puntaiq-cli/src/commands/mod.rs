mod fetch;
mod health;

use std::time::Duration;

use puntaiq_core::{ClientConfig, Endpoint, LeagueId, Origin, PredictionClient, SportKey};
use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::output::{Envelope, EnvelopeError, Meta};

pub struct CommandResult {
    pub endpoint: &'static str,
    pub data: Value,
    pub origin: Option<Origin>,
    pub warnings: Vec<String>,
    pub error: Option<EnvelopeError>,
    pub latency_ms: u64,
}

impl CommandResult {
    pub fn ok(endpoint: &'static str, data: Value) -> Self {
        Self {
            endpoint,
            data,
            origin: None,
            warnings: Vec::new(),
            error: None,
            latency_ms: 0,
        }
    }

    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn with_error(mut self, error: EnvelopeError) -> Self {
        self.error = Some(error);
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }
}

pub async fn run(cli: &Cli) -> Result<Envelope, CliError> {
    let client = PredictionClient::new(build_config(cli)?);

    let command_result = match &cli.command {
        Command::Health => health::run(&client).await?,
        command => {
            let endpoint = to_endpoint(command)?;
            fetch::run(&client, &endpoint, cli.retries).await?
        }
    };

    let CommandResult {
        endpoint,
        data,
        origin,
        warnings,
        error,
        latency_ms,
    } = command_result;

    let mut meta = Meta::new(endpoint, origin, latency_ms)?;
    for warning in warnings {
        meta.push_warning(warning);
    }

    Ok(Envelope { meta, data, error })
}

fn build_config(cli: &Cli) -> Result<ClientConfig, CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url.as_str())?;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config = config.with_request_timeout(Duration::from_millis(timeout_ms.max(1)));
    }
    Ok(config)
}

fn to_endpoint(command: &Command) -> Result<Endpoint, CliError> {
    let endpoint = match command {
        Command::Status => Endpoint::Status,
        Command::Check => Endpoint::CheckStatus,
        Command::Sports => Endpoint::Sports,
        Command::Odds(args) => Endpoint::Odds(SportKey::parse(&args.sport)?),
        Command::Livescore => Endpoint::LiveScores,
        Command::Fixtures(args) => Endpoint::LeagueFixtures(args.league.parse::<LeagueId>()?),
        Command::Teams(args) => Endpoint::Teams(args.league.parse::<LeagueId>()?),
        Command::Leagues => Endpoint::Leagues,
        Command::Health => Endpoint::Status,
    };
    Ok(endpoint)
}
