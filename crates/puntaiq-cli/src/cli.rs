//! CLI argument definitions for puntaiq.
//!
//! # Commands
//!
//! | Command | Endpoint |
//! |---------|----------|
//! | `status` | `/api/status` (ignores the circuit breaker) |
//! | `check` | `/api/check-api-status` |
//! | `sports` | `/api/sports` |
//! | `odds <sport>` | `/api/odds/{sport}` |
//! | `livescore` | `/api/livescore` |
//! | `fixtures <league>` | `/api/fixtures/league/{league}` |
//! | `teams <league>` | `/api/teams/league/{league}` |
//! | `leagues` | `/api/leagues` |
//! | `health` | status probe plus client-side breaker health |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--base-url` | `$PUNTAIQ_API_URL` | Prediction service root |
//! | `--timeout-ms` | `$PUNTAIQ_TIMEOUT_MS` | Per-request timeout |
//! | `--retries` | `0` | Caller-side retries for retryable errors |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--strict` | `false` | Treat warnings as errors |
//!
//! # Examples
//!
//! ```bash
//! puntaiq status --pretty
//! puntaiq odds football --retries 2
//! puntaiq fixtures 39 --base-url http://predict.internal:5000
//! ```

use clap::{Args, Parser, Subcommand};

/// PuntaIQ prediction service client
#[derive(Debug, Parser)]
#[command(
    name = "puntaiq",
    author,
    version,
    about = "Query the PuntaIQ prediction and odds service",
    long_about = "Queries the PuntaIQ prediction service through the same resilient client \
the main server uses: circuit breaker, response cache with stale fallback, and classified \
errors. Output is a JSON envelope on stdout; logs go to stderr (RUST_LOG)."
)]
pub struct Cli {
    /// Prediction service root URL. Overrides PUNTAIQ_API_URL.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Per-request timeout in milliseconds. Overrides PUNTAIQ_TIMEOUT_MS.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Retry retryable failures this many times with exponential backoff.
    #[arg(long, global = true, default_value_t = 0)]
    pub retries: u32,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Treat warnings (e.g. stale data) as failures (exit code 5).
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Service status report. Always reaches the network, even with an open circuit.
    Status,

    /// Ask the service to re-check its upstream integrations.
    Check,

    /// List available sports.
    Sports,

    /// Odds feed for one sport.
    ///
    /// # Examples
    ///
    ///   puntaiq odds football
    ///   puntaiq odds basketball --pretty
    Odds(OddsArgs),

    /// Live scores.
    Livescore,

    /// Fixtures for a league.
    Fixtures(LeagueArgs),

    /// Teams in a league.
    Teams(LeagueArgs),

    /// List leagues.
    Leagues,

    /// Probe the status endpoint and report client-side breaker health.
    Health,
}

#[derive(Debug, Args)]
pub struct OddsArgs {
    /// Sport key, e.g. football, basketball, soccer_epl.
    pub sport: String,
}

#[derive(Debug, Args)]
pub struct LeagueArgs {
    /// Numeric league id, e.g. 39.
    pub league: String,
}
