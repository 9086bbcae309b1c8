pub const SCHEMA: &str = r#"
-- devotionals table (cached daily studies, id assigned by the API)
CREATE TABLE IF NOT EXISTS devotionals (
    id INTEGER PRIMARY KEY,
    program TEXT,
    date TEXT NOT NULL,
    topic TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_devotionals_program_date ON devotionals(program, date DESC);

-- bookmarks table (one row per devotional)
CREATE TABLE IF NOT EXISTS bookmarks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    devotional_id INTEGER NOT NULL UNIQUE,
    program TEXT NOT NULL,
    date TEXT NOT NULL,
    topic TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_bookmarks_date ON bookmarks(date DESC);

-- programs table (snapshot of the last successful remote fetch)
CREATE TABLE IF NOT EXISTS programs (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    created_at TEXT NOT NULL
);
"#;
