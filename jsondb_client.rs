// Command-line client for the JSON database server
// Sends one request built from -t/-k/-v (or read from --in) and prints the reply

use std::process::ExitCode;

use clap::Parser;

use jsondb::client;
use jsondb::config::ClientArgs;

#[tokio::main]
async fn main() -> ExitCode {
    let args = ClientArgs::parse();
    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &ClientArgs) -> jsondb::Result<()> {
    let config = args.config();

    let message = match (&args.input, &args.kind) {
        (Some(file), _) => client::read_request_file(&config.data_dir, file)?,
        (None, Some(kind)) => {
            client::build_request(kind, args.key.as_deref(), args.value.as_deref())?.to_string()
        }
        (None, None) => {
            return Err(jsondb::JsonDbError::invalid_request(
                "either -t <type> or --in <file> is required",
            ))
        }
    };

    println!("Client started!");
    println!("Sent: {}", message);
    let reply = client::send(config.socket_addr(), &message).await?;
    println!("Received: {}", reply);
    Ok(())
}
