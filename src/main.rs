use clap::Parser;

use shortener::config::{self, args::Cli};
use shortener::errors::ShortenerError;
use shortener::runtime::modes::run_server;
use shortener::system::init_logging;

#[actix_web::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if cli.generate_config {
        print!("{}", config::StaticConfig::generate_sample_config());
        return;
    }

    if let Err(e) = config::init_config(cli.config.as_deref()) {
        eprintln!("{}", e.format_colored());
        std::process::exit(1);
    }
    let config = config::get_config();

    // guard 需要存活到进程结束，保证日志刷盘
    let _log_guard = match init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!(
                "{}",
                ShortenerError::configuration(format!("Failed to initialize logging: {:#}", e))
                    .format_colored()
            );
            std::process::exit(1);
        }
    };

    if let Err(e) = run_server(&config).await {
        tracing::error!("Server exited with error: {:#}", e);
        let err = e
            .downcast_ref::<ShortenerError>()
            .cloned()
            .unwrap_or_else(|| ShortenerError::configuration(format!("{:#}", e)));
        eprintln!("{}", err.format_colored());
        std::process::exit(1);
    }
}
