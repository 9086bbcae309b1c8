use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::config::Config;
use crate::db::LocalStore;
use crate::error::{AppError, Result};
use crate::models::{Bookmark, Devotional, NewBookmark};
use crate::remote::{HttpApi, ProgramSource, RemoteSync};

pub struct App {
    config: Config,
    store: LocalStore,
    json: bool,
}

impl App {
    pub async fn new(config: Config, json: bool) -> Result<Self> {
        let store = if config.storage_enabled {
            LocalStore::open(&config.db_path).await?
        } else {
            tracing::warn!("Local storage disabled, nothing will be cached");
            LocalStore::disabled()
        };

        Ok(Self {
            config,
            store,
            json,
        })
    }

    fn remote(&self) -> Result<RemoteSync> {
        let api = HttpApi::new(self.config.api_url()?, self.config.request_timeout())?;
        Ok(RemoteSync::new(Arc::new(api), self.store.clone()))
    }

    pub async fn programs(&self, refresh: bool) -> Result<()> {
        let snapshot = self.remote()?.fetch_and_sync_programs(refresh).await?;

        if self.json {
            return self.print_json(&snapshot);
        }

        match snapshot.source {
            ProgramSource::Remote => {}
            ProgramSource::LocalCache => println!("(offline, showing cached programs)"),
            ProgramSource::Empty => {
                println!("No programs available");
                return Ok(());
            }
        }
        for program in &snapshot.programs {
            println!("{:>5}  {}", program.id, program.display_title());
        }
        Ok(())
    }

    pub async fn sync(&self) -> Result<()> {
        let count = self.remote()?.sync_daily_studies().await?;
        if self.json {
            return self.print_json(&serde_json::json!({ "synced": count }));
        }
        println!("Synced {} daily studies", count);
        Ok(())
    }

    pub async fn studies(&self, program: Option<String>, month: Option<String>) -> Result<()> {
        let program = program.unwrap_or_else(|| self.config.default_program.clone());
        let studies = self
            .store
            .query_devotionals(&program, month.as_deref())
            .await?;

        if self.json {
            return self.print_json(&studies);
        }
        if studies.is_empty() {
            println!("No cached devotionals for {}", program);
        }
        for study in &studies {
            println!("{:>5}  {}  {}", study.id, study.date, study.topic);
        }
        Ok(())
    }

    pub async fn today(&self, program: Option<String>, date: Option<String>) -> Result<()> {
        let program = program.unwrap_or_else(|| self.config.default_program.clone());
        let date = match date {
            Some(date) => parse_date(&date)?,
            None => Local::now().date_naive(),
        };

        let devotional = self.store.query_devotional_by_date(&program, date).await?;
        self.print_devotional(devotional.as_ref())
    }

    pub async fn fetch(&self, date: &str) -> Result<()> {
        let date = parse_date(date)?;
        let devotional = self.remote()?.fetch_daily_study_by_date(date).await;
        self.print_devotional(devotional.as_ref())
    }

    pub async fn add_bookmark(&self, devotional_id: i64) -> Result<()> {
        let devotional = self.cached_devotional(devotional_id).await?;
        self.store
            .add_bookmark(NewBookmark::from_devotional(&devotional))
            .await?;
        self.print_bookmark_state(devotional_id, true)
    }

    pub async fn remove_bookmark(&self, devotional_id: i64) -> Result<()> {
        self.store.remove_bookmark(devotional_id).await?;
        self.print_bookmark_state(devotional_id, false)
    }

    pub async fn toggle_bookmark(&self, devotional_id: i64) -> Result<()> {
        let devotional = self.cached_devotional(devotional_id).await?;
        let bookmarked = self.store.toggle_bookmark(&devotional).await?;
        self.print_bookmark_state(devotional_id, bookmarked)
    }

    pub async fn bookmarks(&self) -> Result<()> {
        let bookmarks: Vec<Bookmark> = self.store.list_bookmarks().await?;

        if self.json {
            return self.print_json(&bookmarks);
        }
        if bookmarks.is_empty() {
            println!("No bookmarks yet");
        }
        for bookmark in &bookmarks {
            println!(
                "{:>5}  {}  {}  {}",
                bookmark.devotional_id, bookmark.date, bookmark.program, bookmark.topic
            );
        }
        Ok(())
    }

    async fn cached_devotional(&self, id: i64) -> Result<Devotional> {
        self.store
            .get_devotional(id)
            .await?
            .ok_or(AppError::DevotionalNotFound(id))
    }

    fn print_devotional(&self, devotional: Option<&Devotional>) -> Result<()> {
        if self.json {
            return self.print_json(&devotional);
        }
        match devotional {
            Some(d) => {
                println!("{} - {}", d.program, d.date);
                println!("{}\n", d.topic);
                println!("{}", d.display_content());
            }
            None => println!("No devotional found"),
        }
        Ok(())
    }

    fn print_bookmark_state(&self, devotional_id: i64, bookmarked: bool) -> Result<()> {
        if self.json {
            return self.print_json(&serde_json::json!({
                "devotional_id": devotional_id,
                "bookmarked": bookmarked,
            }));
        }
        if bookmarked {
            println!("Bookmarked {}", devotional_id);
        } else {
            println!("Removed bookmark {}", devotional_id);
        }
        Ok(())
    }

    fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| AppError::InvalidDate(s.to_string()))
}
