//! Current wallpaper CLI command.

use std::path::Path;

use clap::Args;
use reqwest::Url;

use crate::config;
use crate::error::DaywallError;
use crate::wallpaper::ImageStore;

/// Arguments for `daywall current`.
#[derive(Args, Debug, Default, PartialEq, Eq)]
pub struct CurrentArgs {
    /// Print a `file://` URI instead of a path.
    #[arg(long, short)]
    pub uri: bool,

    /// List every dated image kept in the store, oldest first.
    #[arg(long)]
    pub history: bool,
}

/// Execute the current command.
///
/// # Errors
///
/// Never fails today; the signature matches the other commands.
#[allow(clippy::unnecessary_wraps)] // Consistent return type with other CLI functions
pub fn execute(args: &CurrentArgs) -> Result<(), DaywallError> {
    let config = config::get_config();
    let store = ImageStore::new(config.storage.resolve(&config::config_dir()));

    if args.history {
        for path in store.dated_images() {
            println!("{}", location(&path, args.uri));
        }
        return Ok(());
    }

    match store.read_current_location() {
        Some(path) => println!("{}", location(&path, args.uri)),
        None => {
            println!("No wallpaper has been generated yet.");
            println!("Run 'daywall generate' to create one.");
        }
    }
    Ok(())
}

fn location(path: &Path, as_uri: bool) -> String {
    if as_uri { file_uri(path) } else { path.display().to_string() }
}

/// `file://` URI for `path`, percent-encoded where needed.
fn file_uri(path: &Path) -> String {
    Url::from_file_path(path)
        .map_or_else(|()| format!("file://{}", path.display()), |url| url.to_string())
}
