//! SQLite-backed property graph.
//!
//! Nodes and edges live in one table per label. Every write is an
//! `INSERT … ON CONFLICT … DO UPDATE`, so repeating it converges on a
//! single row. Foreign keys reject edges whose endpoints are missing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use citegraph_core::{
    AuthorRecord, Confidence, Error, GraphSnapshot, PaperRecord, RelationType, Result,
    SnapshotEdge, VenueRecord,
};

use crate::graph::GraphStore;
use crate::schema::{EDGE_SCHEMA_SQL, NODE_SCHEMA_SQL};
use crate::types::*;

const PAPER_COLUMNS: &str = "paper_id, corpus_id, title, year, venue, abstract, url, \
     reference_count, citation_count, is_influential, influential_citation_count, \
     is_open_access, publication_types, publication_date, fields_of_study, match_score, \
     created_at, updated_at";

/// Property-graph store over a single SQLite connection.
pub struct SqliteGraphStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteGraphStore {
    /// Open or create the store at `db_path`, creating parent directories.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::Store(e.to_string()))?;
        }

        let conn = Self::create_connection(&db_path)?;
        Self::init_schema(&conn)?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
        };

        let stats = store.stats()?;
        info!(
            "SqliteGraphStore initialized: {} papers, {} citations, {} semantic relations, path={}",
            stats.papers,
            stats.citations,
            stats.semantic_relations,
            store.db_path.display()
        );

        Ok(store)
    }

    fn create_connection(db_path: &Path) -> Result<Connection> {
        let conn = Connection::open(db_path).map_err(|e| Error::Store(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| Error::Store(e.to_string()))?;
        Ok(conn)
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        let full_schema = format!("{}\n{}", NODE_SCHEMA_SQL, EDGE_SCHEMA_SQL);
        conn.execute_batch(&full_schema)
            .map_err(|e| Error::Store(format!("Schema init failed: {}", e)))?;
        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    // ---------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------

    /// A paper with its authors in byline order and its venue.
    pub fn get_paper(&self, paper_id: &str) -> Result<Option<PaperDetails>> {
        let conn = self.conn.lock();
        let sql = format!("SELECT {} FROM papers WHERE paper_id = ?1", PAPER_COLUMNS);
        let paper = conn
            .prepare_cached(&sql)
            .map_err(|e| Error::Store(e.to_string()))?
            .query_row(params![paper_id], |row| Ok(Self::row_to_paper(row)))
            .optional()
            .map_err(|e| Error::Store(e.to_string()))?;

        let Some(paper) = paper else {
            return Ok(None);
        };

        let mut stmt = conn
            .prepare_cached(
                "SELECT a.author_id, a.name, ab.author_order
                 FROM authored_by ab JOIN authors a ON a.author_id = ab.author_id
                 WHERE ab.paper_id = ?1
                 ORDER BY ab.author_order",
            )
            .map_err(|e| Error::Store(e.to_string()))?;
        let authors: Vec<StoredAuthor> = stmt
            .query_map(params![paper_id], |row| {
                Ok(StoredAuthor {
                    author_id: row.get(0)?,
                    name: row.get(1)?,
                    author_order: row.get(2)?,
                })
            })
            .map_err(|e| Error::Store(e.to_string()))?
            .filter_map(|r| r.ok())
            .collect();

        let venue = conn
            .prepare_cached(
                "SELECT v.venue_id, v.name, v.venue_type, v.alternate_names, v.url
                 FROM published_in pi JOIN venues v ON v.venue_id = pi.venue_id
                 WHERE pi.paper_id = ?1
                 ORDER BY pi.updated_at DESC
                 LIMIT 1",
            )
            .map_err(|e| Error::Store(e.to_string()))?
            .query_row(params![paper_id], |row| {
                Ok(StoredVenue {
                    venue_id: row.get(0)?,
                    name: row.get(1)?,
                    venue_type: row.get(2)?,
                    alternate_names: row
                        .get::<_, String>(3)
                        .ok()
                        .and_then(|s| serde_json::from_str(&s).ok())
                        .unwrap_or_default(),
                    url: row.get(4)?,
                })
            })
            .optional()
            .map_err(|e| Error::Store(e.to_string()))?;

        Ok(Some(PaperDetails {
            paper,
            authors,
            venue,
        }))
    }

    /// Papers written by an author, newest first.
    pub fn author_papers(&self, author_id: &str) -> Result<Vec<StoredPaper>> {
        let sql = format!(
            "SELECT {} FROM papers
             WHERE paper_id IN (SELECT paper_id FROM authored_by WHERE author_id = ?1)
             ORDER BY year DESC, paper_id",
            PAPER_COLUMNS
        );
        self.query_papers(&sql, params![author_id])
    }

    /// Papers published in a venue, newest first.
    pub fn venue_papers(&self, venue_id: &str, limit: usize) -> Result<Vec<StoredPaper>> {
        let sql = format!(
            "SELECT {} FROM papers
             WHERE paper_id IN (SELECT paper_id FROM published_in WHERE venue_id = ?1)
             ORDER BY year DESC, paper_id
             LIMIT ?2",
            PAPER_COLUMNS
        );
        self.query_papers(&sql, params![venue_id, limit as i64])
    }

    /// Case-insensitive title substring search, most cited first.
    pub fn search_papers_by_title(&self, query: &str, limit: usize) -> Result<Vec<StoredPaper>> {
        let sql = format!(
            "SELECT {} FROM papers
             WHERE title IS NOT NULL AND instr(lower(title), lower(?1)) > 0
             ORDER BY citation_count DESC, paper_id
             LIMIT ?2",
            PAPER_COLUMNS
        );
        self.query_papers(&sql, params![query, limit as i64])
    }

    /// Authors who share at least one paper with `author_id`, most frequent first.
    pub fn coauthors(&self, author_id: &str) -> Result<Vec<Coauthor>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT a.author_id, a.name, COUNT(DISTINCT other.paper_id) AS together
                 FROM authored_by mine
                 JOIN authored_by other
                   ON other.paper_id = mine.paper_id AND other.author_id <> mine.author_id
                 JOIN authors a ON a.author_id = other.author_id
                 WHERE mine.author_id = ?1
                 GROUP BY a.author_id, a.name
                 ORDER BY together DESC, a.name",
            )
            .map_err(|e| Error::Store(e.to_string()))?;
        let rows = stmt
            .query_map(params![author_id], |row| {
                Ok(Coauthor {
                    author_id: row.get(0)?,
                    name: row.get(1)?,
                    papers_together: row.get(2)?,
                })
            })
            .map_err(|e| Error::Store(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Ids of the papers `paper_id` cites.
    pub fn citations_from(&self, paper_id: &str) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached("SELECT cited_id FROM cites WHERE citing_id = ?1 ORDER BY cited_id")
            .map_err(|e| Error::Store(e.to_string()))?;
        let rows = stmt
            .query_map(params![paper_id], |row| row.get::<_, String>(0))
            .map_err(|e| Error::Store(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Semantic edges stored for one ordered pair.
    pub fn semantic_relations_between(
        &self,
        citing_id: &str,
        cited_id: &str,
    ) -> Result<Vec<StoredRelation>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT citing_id, cited_id, relation, confidence, evidence, explanation,
                        extracted_by, created_at, updated_at
                 FROM semantic_relations
                 WHERE citing_id = ?1 AND cited_id = ?2
                 ORDER BY relation",
            )
            .map_err(|e| Error::Store(e.to_string()))?;
        let rows = stmt
            .query_map(params![citing_id, cited_id], |row| {
                let label: String = row.get(2)?;
                let confidence: String = row.get(3)?;
                Ok((
                    label,
                    confidence,
                    StoredRelation {
                        citing_id: row.get(0)?,
                        cited_id: row.get(1)?,
                        relation: RelationType::Extends,
                        confidence: Confidence::Low,
                        evidence: row.get(4)?,
                        explanation: row.get(5)?,
                        provenance: row.get(6)?,
                        created_at: row.get(7)?,
                        updated_at: row.get(8)?,
                    },
                ))
            })
            .map_err(|e| Error::Store(e.to_string()))?;

        let mut relations = Vec::new();
        for row in rows {
            let (label, confidence, mut relation) = row.map_err(|e| Error::Store(e.to_string()))?;
            relation.relation = RelationType::from_label(&label)
                .ok_or_else(|| Error::Store(format!("unknown relation label '{}'", label)))?;
            relation.confidence = Confidence::parse(&confidence)
                .ok_or_else(|| Error::Store(format!("unknown confidence '{}'", confidence)))?;
            relations.push(relation);
        }
        Ok(relations)
    }

    /// Entity and edge counts.
    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.conn.lock();
        let count = |table: &str| -> Result<i64> {
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
                .map_err(|e| Error::Store(e.to_string()))
        };
        Ok(StoreStats {
            papers: count("papers")?,
            authors: count("authors")?,
            venues: count("venues")?,
            authorships: count("authored_by")?,
            publications: count("published_in")?,
            citations: count("cites")?,
            semantic_relations: count("semantic_relations")?,
            db_path: self.db_path.display().to_string(),
        })
    }

    fn query_papers(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<StoredPaper>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql).map_err(|e| Error::Store(e.to_string()))?;
        let rows = stmt
            .query_map(params, |row| Ok(Self::row_to_paper(row)))
            .map_err(|e| Error::Store(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    fn row_to_paper(row: &rusqlite::Row<'_>) -> StoredPaper {
        let json_list = |col: &str| -> Vec<String> {
            row.get::<_, String>(col)
                .ok()
                .and_then(|s| serde_json::from_str(&s).ok())
                .unwrap_or_default()
        };
        StoredPaper {
            paper_id: row.get("paper_id").unwrap_or_default(),
            corpus_id: row.get("corpus_id").ok().flatten(),
            title: row.get("title").ok().flatten(),
            year: row.get("year").ok().flatten(),
            venue: row.get("venue").ok().flatten(),
            abstract_text: row.get("abstract").ok().flatten(),
            url: row.get("url").ok().flatten(),
            reference_count: row.get("reference_count").unwrap_or(0),
            citation_count: row.get("citation_count").unwrap_or(0),
            is_influential: row.get("is_influential").unwrap_or(false),
            influential_citation_count: row.get("influential_citation_count").unwrap_or(0),
            is_open_access: row.get("is_open_access").unwrap_or(false),
            publication_types: json_list("publication_types"),
            publication_date: row.get("publication_date").ok().flatten(),
            fields_of_study: json_list("fields_of_study"),
            match_score: row.get("match_score").ok().flatten(),
            created_at: row.get("created_at").unwrap_or(0),
            updated_at: row.get("updated_at").unwrap_or(0),
        }
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl GraphStore for SqliteGraphStore {
    fn upsert_paper(&self, paper: &PaperRecord) -> Result<String> {
        let paper_id = paper.require_id()?;
        let now = now_millis();
        let publication_types =
            serde_json::to_string(paper.publication_types.as_deref().unwrap_or_default())?;
        let fields: Vec<String> = paper.fields_of_study().into_iter().collect();
        let fields_of_study = serde_json::to_string(&fields)?;

        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT INTO papers (
                paper_id, corpus_id, title, year, venue, abstract, url,
                reference_count, citation_count, is_influential, influential_citation_count,
                is_open_access, publication_types, publication_date, fields_of_study,
                match_score, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?17)
             ON CONFLICT(paper_id) DO UPDATE SET
                corpus_id = excluded.corpus_id,
                title = excluded.title,
                year = excluded.year,
                venue = excluded.venue,
                abstract = excluded.abstract,
                url = excluded.url,
                reference_count = excluded.reference_count,
                citation_count = excluded.citation_count,
                is_influential = excluded.is_influential,
                influential_citation_count = excluded.influential_citation_count,
                is_open_access = excluded.is_open_access,
                publication_types = excluded.publication_types,
                publication_date = excluded.publication_date,
                fields_of_study = excluded.fields_of_study,
                match_score = excluded.match_score,
                updated_at = excluded.updated_at",
        )
        .map_err(|e| Error::Store(e.to_string()))?
        .execute(params![
            paper_id,
            paper.corpus_id,
            paper.title,
            paper.year,
            paper.venue,
            paper.abstract_text,
            paper.url,
            paper.reference_count.unwrap_or(0),
            paper.citation_count.unwrap_or(0),
            paper.is_influential.unwrap_or(false),
            paper.influential_citation_count.unwrap_or(0),
            paper.is_open_access.unwrap_or(false),
            publication_types,
            paper.publication_date,
            fields_of_study,
            paper.match_score,
            now,
        ])
        .map_err(|e| Error::Store(format!("upsert paper {}: {}", paper_id, e)))?;

        debug!("Upserted paper {} ({})", paper_id, paper.display_title());
        Ok(paper_id.to_string())
    }

    fn upsert_author(&self, author: &AuthorRecord) -> Result<String> {
        let (Some(author_id), Some(name)) = (
            author.author_id.as_deref().filter(|s| !s.is_empty()),
            author.name.as_deref().filter(|s| !s.is_empty()),
        ) else {
            return Err(Error::InvalidRecord(format!(
                "author without id or name: {:?}",
                author
            )));
        };
        let now = now_millis();

        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT INTO authors (author_id, name, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(author_id) DO UPDATE SET updated_at = excluded.updated_at",
        )
        .map_err(|e| Error::Store(e.to_string()))?
        .execute(params![author_id, name, now])
        .map_err(|e| Error::Store(format!("upsert author {}: {}", author_id, e)))?;

        Ok(author_id.to_string())
    }

    fn link_authorship(&self, paper_id: &str, author_id: &str, order: u32) -> Result<()> {
        let now = now_millis();
        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT INTO authored_by (paper_id, author_id, author_order, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT(paper_id, author_id) DO UPDATE SET
                author_order = excluded.author_order,
                updated_at = excluded.updated_at",
        )
        .map_err(|e| Error::Store(e.to_string()))?
        .execute(params![paper_id, author_id, order, now])
        .map_err(|e| Error::Store(format!("link author {} -> {}: {}", paper_id, author_id, e)))?;
        Ok(())
    }

    fn upsert_venue(&self, venue: &VenueRecord) -> Result<String> {
        if venue.id.is_empty() {
            return Err(Error::InvalidRecord(format!(
                "venue without id: {}",
                venue.name.as_deref().unwrap_or("<unnamed>")
            )));
        }
        let now = now_millis();
        let alternate_names = serde_json::to_string(&venue.alternate_names)?;

        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT INTO venues (venue_id, name, venue_type, alternate_names, url, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             ON CONFLICT(venue_id) DO UPDATE SET
                name = excluded.name,
                venue_type = excluded.venue_type,
                alternate_names = excluded.alternate_names,
                url = excluded.url,
                updated_at = excluded.updated_at",
        )
        .map_err(|e| Error::Store(e.to_string()))?
        .execute(params![
            venue.id,
            venue.name,
            venue.venue_type,
            alternate_names,
            venue.url,
            now
        ])
        .map_err(|e| Error::Store(format!("upsert venue {}: {}", venue.id, e)))?;

        Ok(venue.id.clone())
    }

    fn link_published_in(&self, paper_id: &str, venue_id: &str) -> Result<()> {
        let now = now_millis();
        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT INTO published_in (paper_id, venue_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(paper_id, venue_id) DO UPDATE SET updated_at = excluded.updated_at",
        )
        .map_err(|e| Error::Store(e.to_string()))?
        .execute(params![paper_id, venue_id, now])
        .map_err(|e| Error::Store(format!("link venue {} -> {}: {}", paper_id, venue_id, e)))?;
        Ok(())
    }

    fn link_cites(&self, citing_id: &str, cited_id: &str) -> Result<()> {
        let now = now_millis();
        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT INTO cites (citing_id, cited_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(citing_id, cited_id) DO UPDATE SET updated_at = excluded.updated_at",
        )
        .map_err(|e| Error::Store(e.to_string()))?
        .execute(params![citing_id, cited_id, now])
        .map_err(|e| Error::Store(format!("link cites {} -> {}: {}", citing_id, cited_id, e)))?;
        debug!("Linked {} -[CITES]-> {}", citing_id, cited_id);
        Ok(())
    }

    fn fetch_unclassified_triplets(&self, filter: &TripletFilter) -> Result<Vec<CitationTriplet>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT c.citing_id, COALESCE(p1.title, ''), p1.abstract,
                        c.cited_id, COALESCE(p2.title, ''), p2.abstract
                 FROM cites c
                 JOIN papers p1 ON p1.paper_id = c.citing_id
                 JOIN papers p2 ON p2.paper_id = c.cited_id
                 WHERE p1.abstract IS NOT NULL AND p1.abstract <> ''
                   AND p2.abstract IS NOT NULL AND p2.abstract <> ''
                   AND p2.citation_count >= ?1
                   AND (?2 IS NULL OR p2.year >= ?2)
                   AND (?3 IS NULL OR p1.year >= ?3)
                   AND (?4 OR NOT EXISTS (
                        SELECT 1 FROM semantic_relations s
                        WHERE (s.citing_id = c.citing_id AND s.cited_id = c.cited_id)
                           OR (s.citing_id = c.cited_id AND s.cited_id = c.citing_id)
                   ))
                 ORDER BY p2.citation_count DESC, c.citing_id, c.cited_id",
            )
            .map_err(|e| Error::Store(e.to_string()))?;
        let rows = stmt
            .query_map(
                params![
                    filter.min_citation_count,
                    filter.min_year_cited,
                    filter.min_year_citing,
                    filter.include_classified
                ],
                |row| {
                    Ok(CitationTriplet {
                        citing_id: row.get(0)?,
                        citing_title: row.get(1)?,
                        citing_abstract: row.get(2)?,
                        cited_id: row.get(3)?,
                        cited_title: row.get(4)?,
                        cited_abstract: row.get(5)?,
                    })
                },
            )
            .map_err(|e| Error::Store(e.to_string()))?;

        let mut triplets = Vec::new();
        for row in rows {
            triplets.push(row.map_err(|e| Error::Store(e.to_string()))?);
        }
        debug!("Selected {} citation triplets", triplets.len());
        Ok(triplets)
    }

    fn save_semantic_relationships(
        &self,
        citing_id: &str,
        cited_id: &str,
        relations: &[SemanticRelation],
    ) -> Result<usize> {
        let now = now_millis();
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "INSERT INTO semantic_relations (
                    citing_id, cited_id, relation, confidence, evidence, explanation,
                    extracted_by, created_at, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
                 ON CONFLICT(citing_id, cited_id, relation) DO UPDATE SET
                    confidence = CASE
                        WHEN excluded.confidence = 'high' THEN 'high'
                        ELSE semantic_relations.confidence
                    END,
                    updated_at = excluded.updated_at",
            )
            .map_err(|e| Error::Store(e.to_string()))?;

        let mut written = 0;
        for r in relations {
            stmt.execute(params![
                citing_id,
                cited_id,
                r.relation.label(),
                r.confidence.as_str(),
                r.evidence,
                r.explanation,
                r.provenance,
                now
            ])
            .map_err(|e| {
                Error::Store(format!(
                    "save {} {} -> {}: {}",
                    r.relation.label(),
                    citing_id,
                    cited_id,
                    e
                ))
            })?;
            written += 1;
        }
        Ok(written)
    }

    fn fetch_snapshot(&self, options: &SnapshotOptions) -> Result<GraphSnapshot> {
        let conn = self.conn.lock();

        let mut nodes = Vec::new();
        let mut years = HashMap::new();
        {
            let mut stmt = conn
                .prepare_cached("SELECT paper_id, year FROM papers ORDER BY paper_id")
                .map_err(|e| Error::Store(e.to_string()))?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, Option<i32>>(1)?))
                })
                .map_err(|e| Error::Store(e.to_string()))?;
            for row in rows {
                let (id, year) = row.map_err(|e| Error::Store(e.to_string()))?;
                if let Some(year) = year {
                    years.insert(id.clone(), year);
                }
                nodes.push(id);
            }
        }

        // SQLite treats a negative LIMIT as unbounded.
        let limit = options.limit.map(|l| l as i64).unwrap_or(-1);
        let mut edges = Vec::new();
        {
            let mut stmt = conn
                .prepare_cached(
                    "SELECT citing_id, cited_id, relation FROM semantic_relations
                     ORDER BY created_at, citing_id, cited_id, relation
                     LIMIT ?1",
                )
                .map_err(|e| Error::Store(e.to_string()))?;
            let rows = stmt
                .query_map(params![limit], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                })
                .map_err(|e| Error::Store(e.to_string()))?;
            for row in rows {
                let (source, target, label) = row.map_err(|e| Error::Store(e.to_string()))?;
                let name = RelationType::from_label(&label)
                    .map(|t| t.name().to_string())
                    .unwrap_or(label);
                edges.push(SnapshotEdge::semantic(source, target, &name));
            }
        }

        if options.include_citations {
            let remaining = options
                .limit
                .map(|l| l.saturating_sub(edges.len()) as i64)
                .unwrap_or(-1);
            let mut stmt = conn
                .prepare_cached(
                    "SELECT citing_id, cited_id FROM cites
                     ORDER BY created_at, citing_id, cited_id
                     LIMIT ?1",
                )
                .map_err(|e| Error::Store(e.to_string()))?;
            let rows = stmt
                .query_map(params![remaining], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })
                .map_err(|e| Error::Store(e.to_string()))?;
            for row in rows {
                let (source, target) = row.map_err(|e| Error::Store(e.to_string()))?;
                edges.push(SnapshotEdge::cites(source, target));
            }
        }

        info!("Fetched snapshot: {} nodes, {} edges", nodes.len(), edges.len());
        Ok(GraphSnapshot::new(nodes, edges).with_years(years))
    }
}
