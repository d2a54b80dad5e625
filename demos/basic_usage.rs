// demos/basic_usage.rs
// Run with: cargo run --example basic_usage -- [options.json]
//
// options.json:
// { "host": "ftp.example.com", "port": 21, "username": "user", "password": "secret", "verbose": true }

use rusty_ftp::{CancellationToken, FtpSession, SessionOptions, SuppaFtpTransport, TransferConfig};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt::init();

    // 1. Load connection options
    let options: SessionOptions = match std::env::args().nth(1) {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => SessionOptions::new("ftp.example.com", 21, "anonymous", "guest@example.com", true),
    };

    // 2. Connect and login
    let config = TransferConfig::new(65_536, "./downloads", Some(Duration::from_secs(60)));
    std::fs::create_dir_all(&config.local_dir)?;
    let mut session =
        FtpSession::<SuppaFtpTransport>::connect(&options, config, CancellationToken::new()).await?;
    println!("✅ Connected to {}", session.address());

    // 3. Cancellation token shared by the operations below
    let cancel_token = CancellationToken::new();

    // 4. List files in remote directory
    println!("\n📂 Listing files in /pub...");
    let files = session.list_files("/pub", cancel_token.clone()).await?;
    for file in &files {
        println!("  - {:?} {} ({} bytes)", file.kind, file.name, file.size);
    }
    println!("Found {} entries", files.len());

    // 5. Upload a file
    println!("\n⬆️  Uploading file...");
    match session
        .upload("./document.pdf", "/incoming", None, cancel_token.clone())
        .await
    {
        Ok(report) => println!(
            "✅ Upload completed: {} bytes to {}",
            report.file_size, report.dest_file
        ),
        Err(err) => println!("❌ Upload failed: {}", err.report()),
    }

    // 6. Download a single file
    println!("\n⬇️  Downloading file...");
    let report = session
        .download("/pub", "README", cancel_token.clone())
        .await?;
    println!(
        "✅ Download completed: {} bytes to {}",
        report.file_size, report.dest_file
    );

    // 7. Download up to 5 files of a directory
    println!("\n⬇️  Downloading directory...");
    let result = session
        .download_all("/pub", Some(5), cancel_token.clone())
        .await?;
    println!(
        "✅ {} file(s) downloaded, {} failed",
        result.success_count, result.fail_count
    );

    // 8. Cleanup
    println!("\n🧹 Cleaning up...");
    session.quit(cancel_token).await?;

    println!("✅ All done!");
    Ok(())
}
