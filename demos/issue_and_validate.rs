use std::time::Duration;

use keyturn::{
    encode_private, encode_public, Algorithm, FnKeySource, GenerateToken, GeneratorConfig, KeySet,
    RsaPrivateKey, TokenGenerator, TokenValidator, ValidateToken, ValidatorConfig,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "keyturn=debug".into()))
        .init();

    // Example 1: In-process key sources
    println!("=== Example 1: Issue and Validate ===");
    let key = RsaPrivateKey::new(&mut rand::thread_rng(), 2048)?;
    let private = encode_private("demo-key", Algorithm::RS256, &key);
    let key_set = KeySet::new(vec![encode_public(
        "demo-key",
        Algorithm::RS256,
        &key.to_public_key(),
    )]);

    let generator = TokenGenerator::new(
        GeneratorConfig::new("demo-service").with_token_ttl(Duration::from_secs(300)),
        FnKeySource::new(move || {
            let private = private.clone();
            async move { Ok::<_, keyturn::Error>(private) }
        }),
    )
    .await?;
    let validator = TokenValidator::new(
        ValidatorConfig::new(),
        FnKeySource::new(move || {
            let key_set = key_set.clone();
            async move { Ok::<_, keyturn::Error>(key_set) }
        }),
    )
    .await?;

    let token = generator.generate().await?;
    println!("Issued token signed with '{}'", generator.current_kid().await);

    match validator.validate(&token).await {
        Ok(claims) => {
            println!("✓ Token validated successfully!");
            println!("  Subject: {}", claims.sub);
            println!("  Expires at: {}", claims.exp);
        }
        Err(e) => {
            eprintln!("✗ Token validation failed: {}", e);
        }
    }

    println!();

    // Example 2: A tampered token is rejected
    println!("=== Example 2: Tampered Token ===");
    let tampered = format!("{}x", token);
    match validator.validate(&tampered).await {
        Ok(_) => println!("✗ Tampered token was accepted"),
        Err(e) => println!("✓ Tampered token rejected: {}", e),
    }

    generator.shutdown().await;
    validator.shutdown().await;
    Ok(())
}
