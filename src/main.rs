#![allow(clippy::module_name_repetitions)]
mod config;
mod flight_ops;
mod http_handler;
mod keychain;
mod logger;
mod orchestrator;
mod telemetry;
#[cfg(test)]
mod test_fixtures;

use crate::config::ClientConfig;
use crate::http_handler::http_client::HTTPClient;
use crate::orchestrator::Orchestrator;
use crate::telemetry::RelayEvent;
use std::sync::Arc;

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() {
    let config = ClientConfig::from_env().unwrap_or_else(|e| fatal!("Invalid configuration: {e:?}"));
    log!("Starting with {config:?}");
    let client = HTTPClient::new(config.base_url(), config.http_timeout())
        .unwrap_or_else(|e| fatal!("Could not build the HTTP client: {e}"));
    let orchestrator = Orchestrator::new(config, Arc::new(client));

    let report = match orchestrator.run().await {
        Ok(report) => report,
        Err(e) => fatal!("Control session failed: {e:?}"),
    };
    info!(
        "Controlling {} flight(s), {} failed.",
        report.controlled_count(),
        report.failed().len()
    );
    for failed in report.failed() {
        warn!("Flight {} is not controlled: {}", failed.flight().flight_id(), failed.error());
    }
    for controlled in report.controlled() {
        log!("Flight {} runs {} command(s).", controlled.flight().flight_id(), controlled.issued().len());
    }
    if report.controlled_count() == 0 {
        return;
    }

    let observers: Vec<_> = report
        .controlled()
        .iter()
        .map(|controlled| {
            let flight_id = controlled.flight().flight_id().to_string();
            controlled.link().on_event(move |event| match event {
                Ok(RelayEvent::Unrecognized(value)) => info!("Relay [{flight_id}]: {value}"),
                Ok(other) => info!("Relay [{flight_id}]: {other:?}"),
                Err(e) => warn!("Relay [{flight_id}] sent an undecodable message: {e:?}"),
            })
        })
        .collect();

    {
        let all_closed =
            futures::future::join_all(report.controlled().iter().map(|controlled| controlled.link().closed()));
        tokio::select! {
            interrupted = tokio::signal::ctrl_c() => {
                if let Err(e) = interrupted {
                    error!("Could not listen for Ctrl-C: {e}");
                }
                info!("Shutting down, revoking issued commands.");
            }
            _ = all_closed => warn!("All telemetry links closed."),
        }
    }

    let revoked = orchestrator.revoke(report).await;
    info!("Revoked {revoked} command(s).");
    for observer in observers {
        let _ = observer.await;
    }
}
