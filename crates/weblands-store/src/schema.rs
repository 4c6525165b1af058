//! Schema DDL and the migrations ledger.

/// Baseline schema. `db setup` drops and recreates all of it; `db migrate`
/// replays whatever [`MIGRATIONS`] entries are not yet in the ledger.
pub(crate) const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS land (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL DEFAULT '',
    lang TEXT NOT NULL DEFAULT 'fr',
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS domain (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    http_status TEXT,
    title TEXT,
    description TEXT,
    keywords TEXT,
    created_at TEXT NOT NULL,
    fetched_at TEXT
);

CREATE TABLE IF NOT EXISTS expression (
    id INTEGER PRIMARY KEY,
    land_id INTEGER NOT NULL REFERENCES land(id) ON DELETE CASCADE,
    url TEXT NOT NULL,
    domain_id INTEGER NOT NULL REFERENCES domain(id),
    http_status TEXT,
    lang TEXT,
    title TEXT,
    description TEXT,
    keywords TEXT,
    readable TEXT,
    created_at TEXT NOT NULL,
    published_at TEXT,
    fetched_at TEXT,
    approved_at TEXT,
    readable_at TEXT,
    relevance INTEGER,
    depth INTEGER NOT NULL DEFAULT 0,
    UNIQUE (land_id, url)
);

CREATE INDEX IF NOT EXISTS idx_expression_url ON expression(url);
CREATE INDEX IF NOT EXISTS idx_expression_pending ON expression(land_id, fetched_at);
CREATE INDEX IF NOT EXISTS idx_expression_depth ON expression(depth);

CREATE TABLE IF NOT EXISTS expression_link (
    source_id INTEGER NOT NULL REFERENCES expression(id) ON DELETE CASCADE,
    target_id INTEGER NOT NULL REFERENCES expression(id) ON DELETE CASCADE,
    PRIMARY KEY (source_id, target_id)
);

CREATE TABLE IF NOT EXISTS word (
    id INTEGER PRIMARY KEY,
    term TEXT NOT NULL,
    lemma TEXT NOT NULL,
    UNIQUE (term, lemma)
);

CREATE TABLE IF NOT EXISTS land_dictionary (
    land_id INTEGER NOT NULL REFERENCES land(id) ON DELETE CASCADE,
    word_id INTEGER NOT NULL REFERENCES word(id) ON DELETE CASCADE,
    PRIMARY KEY (land_id, word_id)
);

CREATE TABLE IF NOT EXISTS media (
    id INTEGER PRIMARY KEY,
    expression_id INTEGER NOT NULL REFERENCES expression(id) ON DELETE CASCADE,
    url TEXT NOT NULL,
    type TEXT NOT NULL,
    width INTEGER,
    height INTEGER,
    file_size INTEGER,
    format TEXT,
    color_mode TEXT,
    dominant_colors TEXT,
    has_transparency INTEGER,
    aspect_ratio REAL,
    exif_data TEXT,
    image_hash TEXT,
    analyzed_at TEXT,
    analysis_error TEXT,
    UNIQUE (expression_id, url)
);

CREATE INDEX IF NOT EXISTS idx_media_dimensions ON media(width, height);
CREATE INDEX IF NOT EXISTS idx_media_analyzed ON media(analyzed_at);

CREATE TABLE IF NOT EXISTS tag (
    id INTEGER PRIMARY KEY,
    land_id INTEGER NOT NULL REFERENCES land(id) ON DELETE CASCADE,
    parent_id INTEGER REFERENCES tag(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    sorting INTEGER NOT NULL DEFAULT 0,
    color TEXT
);

CREATE TABLE IF NOT EXISTS tagged_content (
    id INTEGER PRIMARY KEY,
    tag_id INTEGER NOT NULL REFERENCES tag(id) ON DELETE CASCADE,
    expression_id INTEGER NOT NULL REFERENCES expression(id) ON DELETE CASCADE,
    text TEXT NOT NULL,
    from_char INTEGER NOT NULL,
    to_char INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    executed_at TEXT NOT NULL
);
"#;

/// Tables dropped and recreated by `db setup`, children first.
pub(crate) const TABLES: [&str; 10] = [
    "tagged_content",
    "tag",
    "media",
    "land_dictionary",
    "word",
    "expression_link",
    "expression",
    "domain",
    "land",
    "schema_migrations",
];

/// Ordered migration list. The baseline ships everything, so the ledger
/// only records the schema stamp; later releases append `(version, sql)`
/// pairs here.
pub(crate) const MIGRATIONS: [(&str, &str); 1] = [("0001_baseline", "")];
