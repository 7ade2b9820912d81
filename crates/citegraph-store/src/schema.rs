//! Property-graph schema: one table per node label, one per edge label.

/// Node tables: papers, authors, venues.
pub const NODE_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS papers (
    paper_id TEXT PRIMARY KEY,
    corpus_id INTEGER,
    title TEXT,
    year INTEGER,
    venue TEXT,
    abstract TEXT,
    url TEXT,
    reference_count INTEGER NOT NULL DEFAULT 0,
    citation_count INTEGER NOT NULL DEFAULT 0,
    is_influential INTEGER NOT NULL DEFAULT 0,
    influential_citation_count INTEGER NOT NULL DEFAULT 0,
    is_open_access INTEGER NOT NULL DEFAULT 0,
    publication_types TEXT NOT NULL DEFAULT '[]',
    publication_date TEXT,
    fields_of_study TEXT NOT NULL DEFAULT '[]',
    match_score REAL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS authors (
    author_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS venues (
    venue_id TEXT PRIMARY KEY,
    name TEXT,
    venue_type TEXT,
    alternate_names TEXT NOT NULL DEFAULT '[]',
    url TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_papers_citation_count ON papers(citation_count);
"#;

/// Edge tables. Foreign keys require both endpoints to exist.
pub const EDGE_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS authored_by (
    paper_id TEXT NOT NULL REFERENCES papers(paper_id),
    author_id TEXT NOT NULL REFERENCES authors(author_id),
    author_order INTEGER NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (paper_id, author_id)
);

CREATE TABLE IF NOT EXISTS published_in (
    paper_id TEXT NOT NULL REFERENCES papers(paper_id),
    venue_id TEXT NOT NULL REFERENCES venues(venue_id),
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (paper_id, venue_id)
);

CREATE TABLE IF NOT EXISTS cites (
    citing_id TEXT NOT NULL REFERENCES papers(paper_id),
    cited_id TEXT NOT NULL REFERENCES papers(paper_id),
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (citing_id, cited_id)
);

CREATE TABLE IF NOT EXISTS semantic_relations (
    citing_id TEXT NOT NULL REFERENCES papers(paper_id),
    cited_id TEXT NOT NULL REFERENCES papers(paper_id),
    relation TEXT NOT NULL CHECK (relation IN (
        'EXTENDS', 'SOLVES', 'OUTPERFORMS', 'VALIDATES', 'CONTRADICTS',
        'REQUIRES', 'ENABLES', 'ADAPTS_FROM', 'ACHIEVES', 'CHALLENGES'
    )),
    confidence TEXT NOT NULL CHECK (confidence IN ('high', 'medium', 'low')),
    evidence TEXT NOT NULL DEFAULT '',
    explanation TEXT NOT NULL DEFAULT '',
    extracted_by TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (citing_id, cited_id, relation)
);

CREATE INDEX IF NOT EXISTS idx_authored_by_author ON authored_by(author_id);
CREATE INDEX IF NOT EXISTS idx_published_in_venue ON published_in(venue_id);
CREATE INDEX IF NOT EXISTS idx_cites_cited ON cites(cited_id);
CREATE INDEX IF NOT EXISTS idx_semantic_cited ON semantic_relations(cited_id, citing_id);
"#;
