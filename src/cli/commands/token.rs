use chrono::Duration;
use clap::Args;
use serde_json::json;

use crate::auth::{generate_jwt, Claims};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::types::DbId;

#[derive(Args, Debug)]
pub struct TokenArgs {
    #[arg(long, help = "User id to place in the token")]
    pub user_id: DbId,

    #[arg(long, default_value_t = 60, help = "Minutes until the token expires")]
    pub ttl_minutes: i64,
}

pub fn handle(args: TokenArgs, config: AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    if args.user_id <= 0 {
        anyhow::bail!("--user-id must be a positive integer");
    }
    if args.ttl_minutes <= 0 {
        anyhow::bail!("--ttl-minutes must be positive");
    }

    let claims = Claims::new(args.user_id, Duration::minutes(args.ttl_minutes));
    let token = generate_jwt(&claims, config.security.jwt_secret.expose())?;

    match output_format {
        OutputFormat::Text => {
            println!("{}", token);
            Ok(())
        }
        OutputFormat::Json => output_success(
            output_format,
            "Token generated",
            Some(json!({
                "token": token,
                "user_id": args.user_id,
                "expires_at": claims.exp,
            })),
        ),
    }
}
