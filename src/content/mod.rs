pub mod bank;
pub mod catalog;
pub mod question;

use rust_embed::Embed;

/// Bundled starter content: the default catalog plus one question file per
/// topic. Used whenever the content directory has no usable counterpart.
#[derive(Embed)]
#[folder = "assets/data/"]
pub(crate) struct ContentAssets;
