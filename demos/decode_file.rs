use std::error::Error;
use std::fs::File;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "playlist.m3u8".to_string());
    let file = File::open(&path)?;

    match m3u8_decoder::decode_reader(file) {
        Ok(playlist) => {
            let kind = if playlist.is_master { "Master" } else { "Media" };
            println!("{} playlist ({} entries):\n{}", kind, playlist.entries.len(), playlist);
        }
        Err(err) => {
            eprintln!("Error in {}: {}", path, err);
            if !err.partial().entries.is_empty() {
                eprintln!("Decoded before the error:\n{}", err.partial());
            }
            std::process::exit(1);
        }
    }

    Ok(())
}
