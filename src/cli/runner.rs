//! CLI runner - executes commands

use crate::catalog::{self, Catalog};
use crate::cli::commands::{Cli, Commands};
use crate::client::HttpAdsClient;
use crate::config::ConnectorConfig;
use crate::error::{Error, Result};
use crate::output::SingerWriter;
use crate::state::BookmarkManager;
use crate::sync::SyncPipeline;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Discover => self.discover(),
            Commands::Sync { streams } => self.sync(streams.as_deref()).await,
        }
    }

    /// Print the discovery catalog
    fn discover(&self) -> Result<()> {
        let catalog = catalog::discover()?;
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        Ok(())
    }

    /// Run a sync to stdout
    async fn sync(&self, streams: Option<&str>) -> Result<()> {
        let config = self.load_config()?;
        let catalog = self.load_catalog(streams)?;
        let bookmarks = self.load_bookmarks()?;
        let client = HttpAdsClient::from_config(&config)?;

        let stdout = std::io::stdout();
        let mut writer = SingerWriter::new(stdout.lock());

        let stats = SyncPipeline::new(&client, &config, &catalog, &bookmarks, &mut writer)
            .run()
            .await?;
        bookmarks.save().await?;

        info!(
            records = stats.total_records(),
            backoff = ?client.total_backoff(),
            "sync complete"
        );

        if stats.has_failures() {
            return Err(Error::Other(format!(
                "{} stream(s) failed: {}",
                stats.failed.len(),
                stats.failed.join(", ")
            )));
        }
        Ok(())
    }

    /// Load configuration from flag or file
    fn load_config(&self) -> Result<ConnectorConfig> {
        if let Some(json) = &self.cli.config_json {
            return ConnectorConfig::from_json(json);
        }
        let path = self
            .cli
            .config
            .as_ref()
            .ok_or_else(|| Error::config("Config file not specified (use -c flag)"))?;
        ConnectorConfig::from_file(path)
    }

    /// Load the catalog, applying any command-line stream override
    ///
    /// Without a catalog file every stream is selected; a `--streams` list
    /// overrides whatever selection the catalog carries.
    fn load_catalog(&self, streams: Option<&str>) -> Result<Catalog> {
        let mut catalog = match &self.cli.catalog {
            Some(path) => Catalog::from_file(path)?,
            None => {
                let mut catalog = catalog::discover()?;
                for entry in &mut catalog.streams {
                    entry.selected = true;
                }
                catalog
            }
        };

        if let Some(streams) = streams {
            let wanted: Vec<&str> = streams
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            for name in &wanted {
                if catalog.get(name).is_none() {
                    return Err(Error::StreamNotFound {
                        stream: (*name).to_string(),
                    });
                }
            }
            for entry in &mut catalog.streams {
                entry.selected = wanted.contains(&entry.tap_stream_id.as_str());
            }
        }

        Ok(catalog)
    }

    /// Load state from flag, file, or start empty
    fn load_bookmarks(&self) -> Result<BookmarkManager> {
        if let Some(json) = &self.cli.state_json {
            return BookmarkManager::from_json(json);
        }
        match &self.cli.state {
            Some(path) => BookmarkManager::from_file(path),
            None => Ok(BookmarkManager::in_memory()),
        }
    }
}
