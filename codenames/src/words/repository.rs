//! Word repository trait and its in-memory and PostgreSQL implementations.

use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::errors::{WordError, WordResult};

/// Words every fresh store starts with.
pub const DEFAULT_WORDS: &[&str] = &[
    "AFRICA", "AGENT", "AIR", "ALIEN", "ALPS", "AMAZON", "AMBULANCE", "AMERICA", "ANGEL",
    "ANTARCTICA", "APPLE", "ARM", "ATLANTIS", "AUSTRALIA", "AZTEC", "BACK", "BALL", "BAND",
    "BANK", "BAR", "BARK", "BAT", "BATTERY", "BEACH", "BEAR", "BEAT", "BED", "BEIJING", "BELL",
    "BELT", "BERLIN", "BERMUDA", "BERRY", "BILL", "BLOCK", "BOARD", "BOLT", "BOMB", "BOND",
    "BOOM", "BOOT", "BOTTLE", "BOW", "BOX", "BRIDGE", "BRUSH", "BUCK", "BUFFALO", "BUG",
    "BUGLE", "BUTTON", "CALF", "CANADA", "CAP", "CAPITAL", "CAR", "CARD", "CARROT", "CASINO",
    "CAST", "CAT", "CELL", "CENTAUR", "CENTER", "CHAIR", "CHANGE", "CHARGE", "CHECK",
];

/// Trait for word pool operations
#[async_trait]
pub trait WordRepository: Send + Sync {
    /// All active words
    async fn list_words(&self) -> WordResult<Vec<String>>;

    /// Add (or reactivate) a single word
    async fn add_word(&self, word: &str) -> WordResult<()>;

    /// Add (or reactivate) several words, skipping empty entries.
    /// Returns how many words were accepted.
    async fn add_words(&self, words: &[String]) -> WordResult<usize>;

    /// Mark a word inactive so new boards stop using it
    async fn deactivate_word(&self, word: &str) -> WordResult<()>;
}

fn normalize(word: &str) -> Option<String> {
    let word = word.trim().to_uppercase();
    (!word.is_empty()).then_some(word)
}

#[derive(Default)]
struct WordTable {
    /// Insertion order, so listings are stable.
    order: Vec<String>,
    active: HashMap<String, bool>,
}

impl WordTable {
    fn upsert(&mut self, word: String) {
        if !self.active.contains_key(&word) {
            self.order.push(word.clone());
        }
        self.active.insert(word, true);
    }
}

/// Process-local word pool
pub struct InMemoryWordRepository {
    words: RwLock<WordTable>,
}

impl InMemoryWordRepository {
    /// Repository seeded with [`DEFAULT_WORDS`]
    pub fn new() -> Self {
        Self::with_words(DEFAULT_WORDS.iter().copied())
    }

    pub fn with_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = WordTable::default();
        for word in words {
            if let Some(word) = normalize(word.as_ref()) {
                table.upsert(word);
            }
        }
        Self {
            words: RwLock::new(table),
        }
    }
}

impl Default for InMemoryWordRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WordRepository for InMemoryWordRepository {
    async fn list_words(&self) -> WordResult<Vec<String>> {
        let table = self.words.read().await;
        Ok(table
            .order
            .iter()
            .filter(|w| table.active.get(*w).copied().unwrap_or(false))
            .cloned()
            .collect())
    }

    async fn add_word(&self, word: &str) -> WordResult<()> {
        let word = normalize(word).ok_or(WordError::EmptyWord)?;
        self.words.write().await.upsert(word);
        Ok(())
    }

    async fn add_words(&self, words: &[String]) -> WordResult<usize> {
        let mut table = self.words.write().await;
        let mut added = 0;
        for word in words.iter().filter_map(|w| normalize(w)) {
            table.upsert(word);
            added += 1;
        }
        Ok(added)
    }

    async fn deactivate_word(&self, word: &str) -> WordResult<()> {
        let word = normalize(word).ok_or(WordError::EmptyWord)?;
        if let Some(active) = self.words.write().await.active.get_mut(&word) {
            *active = false;
        }
        Ok(())
    }
}

/// PostgreSQL implementation of `WordRepository`
pub struct PgWordRepository {
    pool: PgPool,
}

impl PgWordRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the `words` table if needed and seeds it with
    /// [`DEFAULT_WORDS`] when it is empty.
    pub async fn init(&self) -> WordResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS words (
                id SERIAL PRIMARY KEY,
                word TEXT NOT NULL UNIQUE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                active BOOLEAN NOT NULL DEFAULT true
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM words")
            .fetch_one(&self.pool)
            .await?;

        if count == 0 {
            let mut tx = self.pool.begin().await?;
            for word in DEFAULT_WORDS {
                sqlx::query("INSERT INTO words (word) VALUES ($1) ON CONFLICT (word) DO NOTHING")
                    .bind(*word)
                    .execute(&mut *tx)
                    .await?;
            }
            tx.commit().await?;
            log::info!("Seeded word table with {} default words", DEFAULT_WORDS.len());
        }

        Ok(())
    }
}

#[async_trait]
impl WordRepository for PgWordRepository {
    async fn list_words(&self) -> WordResult<Vec<String>> {
        let words = sqlx::query_scalar("SELECT word FROM words WHERE active = true ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(words)
    }

    async fn add_word(&self, word: &str) -> WordResult<()> {
        let word = normalize(word).ok_or(WordError::EmptyWord)?;
        sqlx::query(
            "INSERT INTO words (word) VALUES ($1) ON CONFLICT (word) DO UPDATE SET active = true",
        )
        .bind(word)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn add_words(&self, words: &[String]) -> WordResult<usize> {
        let mut tx = self.pool.begin().await?;
        let mut added = 0;
        for word in words.iter().filter_map(|w| normalize(w)) {
            sqlx::query(
                "INSERT INTO words (word) VALUES ($1) ON CONFLICT (word) DO UPDATE SET active = true",
            )
            .bind(word)
            .execute(&mut *tx)
            .await?;
            added += 1;
        }
        tx.commit().await?;
        Ok(added)
    }

    async fn deactivate_word(&self, word: &str) -> WordResult<()> {
        let word = normalize(word).ok_or(WordError::EmptyWord)?;
        sqlx::query("UPDATE words SET active = false WHERE word = $1")
            .bind(word)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
