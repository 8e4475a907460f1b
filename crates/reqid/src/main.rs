//! reqid-echo: demo service that assigns a request id to every request and
//! echoes it back.

use reqid::AppConfig;

fn main() -> anyhow::Result<()> {
    let config_path = {
        let args: Vec<String> = std::env::args().collect();
        args.iter()
            .position(|a| a == "--config")
            .and_then(|i| args.get(i + 1).cloned())
            .or_else(|| args.get(1).filter(|a| !a.starts_with('-')).cloned())
            .or_else(|| std::env::var("REQID_CONFIG").ok())
            .unwrap_or_else(|| "reqid.toml".to_string())
    };

    let config = AppConfig::load(&config_path)?;

    // OTLP's tonic exporter needs a reactor, so build the runtime first.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let tracing_guard = reqid_tracing::init_tracing(&config.tracing);

        tracing::info!(
            config_path = %config_path,
            listen_address = %config.server.listen_address,
            header_name = %config.request_id.header_name,
            set_response_header = config.request_id.set_response_header,
            otlp_export = tracing_guard.exporting(),
            "Starting reqid-echo"
        );

        let result = reqid::server::run(config).await;
        drop(tracing_guard);
        result
    })
}
