use std::env;

use rentbuy::api::RunError;

#[tokio::main]
async fn main() {
    rentbuy::logging::init();

    let raw_args: Vec<String> = env::args().collect();
    match raw_args.get(1).map(|s| s.as_str()) {
        Some("serve") => {
            let port = raw_args
                .get(2)
                .and_then(|s| s.parse::<u16>().ok())
                .unwrap_or(8080);
            if let Err(e) = rentbuy::api::run_http_server(port).await {
                eprintln!("Server error: {e}");
                std::process::exit(1);
            }
        }
        Some("run") => {
            let args =
                std::iter::once("rentbuy run".to_string()).chain(raw_args[2..].iter().cloned());
            match rentbuy::api::run_cli(args) {
                Ok(output) => println!("{output}"),
                Err(RunError::Args(e)) => e.exit(),
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(1);
                }
            }
        }
        _ => {
            eprintln!("Usage: rentbuy serve [port]");
            eprintln!("       rentbuy run [--help | flags]");
            std::process::exit(1);
        }
    }
}
