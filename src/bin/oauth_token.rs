use anyhow::Result;
use clap::Parser;

use eventdesk::oauth::GoogleOAuth;

#[derive(Debug, Parser)]
#[command(
    about = "Print the Google consent URL, or exchange an authorization code for tokens"
)]
struct Args {
    /// Authorization code returned to the redirect URI
    #[arg(long)]
    code: Option<String>,

    /// Scopes to request when printing the consent URL
    #[arg(long, value_delimiter = ',', default_value = "openid,email,profile")]
    scopes: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    eventdesk::init_tracing();

    let args = Args::parse();
    let oauth = GoogleOAuth::from_env()?;

    match args.code {
        None => {
            let scopes: Vec<&str> = args.scopes.iter().map(String::as_str).collect();
            println!("Open this URL and approve access:");
            println!("{}", oauth.authorization_url(&scopes)?);
            println!("Then rerun with --code <code>.");
        }
        Some(code) => {
            let tokens = oauth.exchange_code(&code).await?;
            println!("{}", serde_json::to_string_pretty(&tokens)?);
        }
    }
    Ok(())
}
