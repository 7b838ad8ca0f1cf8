// Mint a bearer token for local testing against a gated server.
//
// Usage: issue-token <user-id>
// Reads TASK_API_JWT_SECRET (and .env) the same way the server does.

use std::process::ExitCode;

use task_api::{AppConfig, TokenCodec};

fn main() -> ExitCode {
    let Some(raw_id) = std::env::args().nth(1) else {
        eprintln!("usage: issue-token <user-id>");
        return ExitCode::from(2);
    };

    let user_id = match raw_id.parse::<i64>() {
        Ok(id) => id,
        Err(_) => {
            eprintln!("user id must be an integer, got {:?}", raw_id);
            return ExitCode::from(2);
        }
    };

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match TokenCodec::new(&config.auth).issue(user_id) {
        Ok(token) => {
            println!("{}", token);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("failed to issue token: {}", e);
            ExitCode::FAILURE
        }
    }
}
