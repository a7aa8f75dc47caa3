use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use authguard_lib::{
    clock::ManualClock,
    config::{Settings, DEFAULT_CONFIG_FILE},
    logging, AppState,
};
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;

/// Inspect and exercise the lockout policy
#[derive(Parser, Debug)]
#[command(name = "authguard", version)]
struct Cli {
    /// Config file; environment variables prefixed AUTHGUARD_ override it
    #[arg(long, short, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Feed failures at the given second offsets and print the state after each
    Replay {
        identifier: String,
        /// Offset in seconds from the first failure; repeatable
        #[arg(long = "at", required = true)]
        at: Vec<u64>,
        /// Also report the state at this offset, after all failures
        #[arg(long)]
        check_at: Option<u64>,
    },
    /// Print the effective policy and its backoff table
    Policy {
        /// Failures past the threshold to tabulate
        #[arg(long, default_value_t = 8)]
        rows: u32,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplayStep {
    offset_secs: u64,
    failure: bool,
    count: u32,
    locked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    locked_until: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BackoffRow {
    count: u32,
    lock_secs: i64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load_from(&cli.config)
        .with_context(|| format!("loading settings from {}", cli.config.display()))?;
    logging::init(&settings)?;
    debug!(?settings, "Loaded settings");

    match cli.command {
        Command::Replay {
            identifier,
            at,
            check_at,
        } => replay(settings, &identifier, &at, check_at),
        Command::Policy { rows } => policy(&settings, rows),
    }
}

fn replay(
    settings: Settings,
    identifier: &str,
    offsets: &[u64],
    check_at: Option<u64>,
) -> anyhow::Result<()> {
    for step in replay_steps(settings, identifier, offsets, check_at, Utc::now())? {
        println!("{}", serde_json::to_string(&step)?);
    }
    Ok(())
}

/// Drive a tracker on a manual clock starting at `start`
fn replay_steps(
    settings: Settings,
    identifier: &str,
    offsets: &[u64],
    check_at: Option<u64>,
    start: DateTime<Utc>,
) -> anyhow::Result<Vec<ReplayStep>> {
    let clock = Arc::new(ManualClock::new(start));
    let state = AppState::with_clock(settings, clock.clone())?;
    let tracker = &state.tracker;

    let at = |offset: u64| -> anyhow::Result<DateTime<Utc>> {
        let offset = i64::try_from(offset).context("offset too large")?;
        Duration::try_seconds(offset)
            .and_then(|d| start.checked_add_signed(d))
            .context("offset too large")
    };

    let mut steps: Vec<(u64, bool)> = offsets.iter().map(|&o| (o, true)).collect();
    if let Some(offset) = check_at {
        steps.push((offset, false));
    }

    let mut out = Vec::with_capacity(steps.len());
    for (offset, failure) in steps {
        clock.set(at(offset)?);
        let count = if failure {
            tracker.record_failure(identifier).count
        } else {
            tracker.attempt_record(identifier).map_or(0, |r| r.count)
        };
        let info = tracker.get_lock_info(identifier);

        out.push(ReplayStep {
            offset_secs: offset,
            failure,
            count,
            locked: info.is_some(),
            retry_after_seconds: info.as_ref().map(|i| i.retry_after_seconds),
            locked_until: info.map(|i| i.locked_until),
        });
    }

    Ok(out)
}

fn policy(settings: &Settings, rows: u32) -> anyhow::Result<()> {
    let policy = settings.lockout.policy();
    println!("{}", serde_json::to_string_pretty(&settings.lockout)?);

    let table: Vec<BackoffRow> = (0..=rows)
        .filter_map(|extra| {
            let count = policy.threshold.checked_add(extra)?;
            let lock = policy.lock_duration(count)?;
            Some(BackoffRow {
                count,
                lock_secs: lock.num_seconds(),
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&table)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_replay_five_failures_in_one_second() {
        let steps =
            replay_steps(Settings::default(), "a@b.com", &[0, 0, 0, 0, 1], Some(61), start())
                .unwrap();
        let lines: Vec<String> = steps
            .iter()
            .map(|s| serde_json::to_string(s).unwrap())
            .collect();

        assert_eq!(lines.len(), 6);
        assert_eq!(
            lines[0],
            r#"{"offsetSecs":0,"failure":true,"count":1,"locked":false}"#
        );
        assert_eq!(
            lines[4],
            r#"{"offsetSecs":1,"failure":true,"count":5,"locked":true,"retryAfterSeconds":59,"lockedUntil":"2024-06-01T12:01:00Z"}"#
        );
        assert_eq!(
            lines[5],
            r#"{"offsetSecs":61,"failure":false,"count":5,"locked":false}"#
        );
    }

    #[test]
    fn test_replay_check_of_unknown_identifier() {
        let steps = replay_steps(Settings::default(), "x", &[], Some(5), start()).unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].count, 0);
        assert!(!steps[0].locked);
    }

    #[test]
    fn test_replay_rejects_invalid_settings() {
        let mut settings = Settings::default();
        settings.lockout.threshold = 0;
        assert!(replay_steps(settings, "a@b.com", &[0], None, start()).is_err());
    }
}
