use clap::Parser;

use eventdesk::auth::{generate_token, sha256_hex};

#[derive(Debug, Parser)]
#[command(about = "Generate a random API key and the SHA-256 digest to store for it")]
struct Args {
    /// Key prefix, e.g. `evk` for server keys
    #[arg(long, default_value = "evk")]
    prefix: String,
}

fn main() {
    let args = Args::parse();
    let key = generate_token(&args.prefix);
    println!("API key:  {key}");
    println!("SHA-256:  {}", sha256_hex(&key));
    println!("Store only the digest; the key is not shown again.");
}
