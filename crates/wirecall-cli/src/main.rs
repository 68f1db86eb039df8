//! wirecall CLI: serve the demo handlers or call methods on a running server.

use clap::{Parser, Subcommand};
use wirecall_cli::commands;

/// wirecall CLI: named-method RPC over HTTP
#[derive(Parser)]
#[command(name = "wirecall", version, about = "wirecall CLI: named-method RPC over HTTP")]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server with the demo handlers
    Serve {
        /// Host to bind to
        #[arg(long, env = "WIRECALL_HOST", default_value = "127.0.0.1")]
        host: String,
        /// Port to listen on
        #[arg(long, env = "WIRECALL_PORT", default_value_t = 3210)]
        port: u16,
        /// Path prefix in front of /api/<method>
        #[arg(long, env = "WIRECALL_ROUTE_PREFIX", default_value = "")]
        route_prefix: String,
    },

    /// Call a method on a running server
    Call {
        /// Method name (e.g. "math.add")
        method: String,
        /// Call argument as a JSON string; omitted means {}
        #[arg(long)]
        args: Option<String>,
        /// Server base URL
        #[arg(long, env = "WIRECALL_URL", default_value = "http://127.0.0.1:3210")]
        url: String,
        /// Path prefix in front of /api/<method>
        #[arg(long, env = "WIRECALL_ROUTE_PREFIX")]
        route_prefix: Option<String>,
    },

    /// List the demo methods served by `wirecall serve`
    Methods,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "wirecall_core=info,wirecall_server=info,wirecall_cli=info,tower_http=info".into()
            }),
        )
        .init();

    let result = match cli.command {
        Some(Commands::Serve {
            host,
            port,
            route_prefix,
        }) => commands::serve::run(host, port, route_prefix).await,

        Some(Commands::Call {
            method,
            args,
            url,
            route_prefix,
        }) => {
            commands::call::run(&url, route_prefix.as_deref(), &method, args.as_deref()).await
        }

        Some(Commands::Methods) => commands::methods::list(),

        None => {
            use clap::CommandFactory;
            Cli::command().print_help().ok();
            println!();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
