//! SQLite database for grade records, conversations and the slide index
//!
//! Grade records and conversations are append-only: rows are inserted and
//! never updated.

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{
    ConversationSummary, Grade, GradeRecord, RetrievedSnippet, SlideChunk, SlideDocument, SlideFileType,
    StoredConversation, Transcript,
};

use super::transcript_codec;

/// Timestamp layout used in the `timestamp` columns
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Most search terms taken from a query
const MAX_QUERY_TERMS: usize = 16;

/// Words too common to be useful in a full-text query
const STOPWORDS: &[&str] = &[
    "the", "and", "for", "are", "was", "were", "what", "how", "why", "when", "where", "who",
    "which", "does", "did", "can", "could", "would", "should", "you", "your", "this", "that",
    "with", "from", "have", "has", "about", "into", "there", "their", "they", "them", "then",
    "than", "is", "it", "do",
];

/// SQLite-backed persistence store
pub struct CoachDb {
    conn: Arc<Mutex<Connection>>,
}

impl CoachDb {
    /// Create or open the database at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::storage(format!("Failed to open database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::storage(format!("Failed to open in-memory database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate()?;
        Ok(db)
    }

    /// Create tables if they do not exist
    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA foreign_keys=ON;
        "#,
        )
        .map_err(|e| Error::storage(format!("Failed to set pragmas: {}", e)))?;

        conn.execute_batch(
            r#"
            -- One row per graded session
            CREATE TABLE IF NOT EXISTS grade_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                grade TEXT NOT NULL,
                questions TEXT NOT NULL,
                feedback TEXT NOT NULL
            );

            -- One row per saved transcript
            CREATE TABLE IF NOT EXISTS conversations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                messages TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_conversations_username ON conversations(username);

            -- Indexed slide decks
            CREATE TABLE IF NOT EXISTS slide_documents (
                id TEXT PRIMARY KEY,
                filename TEXT NOT NULL,
                file_type TEXT NOT NULL,
                content_hash TEXT NOT NULL UNIQUE,
                chunk_count INTEGER NOT NULL,
                ingested_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS slide_chunks (
                id TEXT PRIMARY KEY,
                document_id TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                content TEXT NOT NULL,
                page_number INTEGER,
                FOREIGN KEY (document_id) REFERENCES slide_documents(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_slide_chunks_document_id ON slide_chunks(document_id);

            -- FTS5 mirror of chunk text for retrieval
            CREATE VIRTUAL TABLE IF NOT EXISTS slide_chunks_fts USING fts5(
                content,
                content='slide_chunks',
                content_rowid='rowid'
            );

            CREATE TRIGGER IF NOT EXISTS slide_chunks_ai AFTER INSERT ON slide_chunks BEGIN
                INSERT INTO slide_chunks_fts(rowid, content) VALUES (NEW.rowid, NEW.content);
            END;

            CREATE TRIGGER IF NOT EXISTS slide_chunks_ad AFTER DELETE ON slide_chunks BEGIN
                INSERT INTO slide_chunks_fts(slide_chunks_fts, rowid, content)
                VALUES ('delete', OLD.rowid, OLD.content);
            END;
        "#,
        )
        .map_err(|e| Error::storage(format!("Failed to run migrations: {}", e)))?;

        tracing::info!("Database migrations complete");
        Ok(())
    }

    // ==================== Grade Records ====================

    /// Append a grade record; questions are stored newline-joined
    pub fn save_grade(
        &self,
        user: &str,
        grade: Grade,
        questions: &[String],
        feedback: &str,
    ) -> Result<GradeRecord> {
        self.save_grade_at(user, grade, questions, feedback, Utc::now())
    }

    pub(crate) fn save_grade_at(
        &self,
        user: &str,
        grade: Grade,
        questions: &[String],
        feedback: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<GradeRecord> {
        let conn = self.conn.lock();
        let questions_text = questions.join("\n");

        conn.execute(
            r#"
            INSERT INTO grade_records (username, timestamp, grade, questions, feedback)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                user,
                format_timestamp(&timestamp),
                grade.to_string(),
                questions_text,
                feedback,
            ],
        )
        .map_err(|e| Error::storage(format!("Failed to save grade record: {}", e)))?;

        let id = conn.last_insert_rowid();
        tracing::info!("Saved grade record {} for {} ({})", id, user, grade);

        Ok(GradeRecord {
            id,
            user: user.to_string(),
            timestamp: timestamp.trunc_subsecs(0),
            grade,
            questions: questions_text,
            feedback: feedback.to_string(),
        })
    }

    /// All grade records, oldest first
    pub fn list_grade_records(&self) -> Result<Vec<GradeRecord>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(
                r#"
                SELECT id, username, timestamp, grade, questions, feedback
                FROM grade_records
                ORDER BY timestamp ASC, id ASC
                "#,
            )
            .map_err(|e| Error::storage(format!("Failed to prepare query: {}", e)))?;

        let records = stmt
            .query_map([], row_to_grade_record)
            .map_err(|e| Error::storage(format!("Failed to list grade records: {}", e)))?
            .filter_map(|r| match r {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("Skipping unreadable grade record: {}", e);
                    None
                }
            })
            .collect();

        Ok(records)
    }

    /// Persist a graded session: its transcript and its grade record
    ///
    /// Both rows are written in one transaction, so a failure leaves neither.
    pub fn record_session(
        &self,
        user: &str,
        transcript: &Transcript,
        grade: Grade,
        questions: &[String],
        feedback: &str,
    ) -> Result<GradeRecord> {
        let encoded = transcript_codec::encode(transcript)?;
        let now = Utc::now().trunc_subsecs(0);
        let timestamp = format_timestamp(&now);
        let questions_text = questions.join("\n");

        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::storage(format!("Failed to begin transaction: {}", e)))?;

        tx.execute(
            "INSERT INTO conversations (username, timestamp, messages) VALUES (?1, ?2, ?3)",
            params![user, timestamp, encoded],
        )
        .map_err(|e| Error::storage(format!("Failed to save conversation: {}", e)))?;

        tx.execute(
            r#"
            INSERT INTO grade_records (username, timestamp, grade, questions, feedback)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![user, timestamp, grade.to_string(), questions_text, feedback],
        )
        .map_err(|e| Error::storage(format!("Failed to save grade record: {}", e)))?;

        let id = tx.last_insert_rowid();
        tx.commit()
            .map_err(|e| Error::storage(format!("Failed to commit session: {}", e)))?;

        tracing::info!("Recorded session for {}: grade record {} ({})", user, id, grade);

        Ok(GradeRecord {
            id,
            user: user.to_string(),
            timestamp: now,
            grade,
            questions: questions_text,
            feedback: feedback.to_string(),
        })
    }

    // ==================== Conversations ====================

    /// Append a transcript, with system messages stripped
    pub fn save_conversation(&self, user: &str, transcript: &Transcript) -> Result<i64> {
        self.save_conversation_at(user, transcript, Utc::now())
    }

    pub(crate) fn save_conversation_at(
        &self,
        user: &str,
        transcript: &Transcript,
        timestamp: DateTime<Utc>,
    ) -> Result<i64> {
        let encoded = transcript_codec::encode(transcript)?;
        let id = self.insert_raw_conversation(user, &format_timestamp(&timestamp), &encoded)?;
        tracing::info!("Saved conversation {} for {}", id, user);
        Ok(id)
    }

    /// Insert a conversation row with an already-encoded transcript column
    pub(crate) fn insert_raw_conversation(
        &self,
        user: &str,
        timestamp: &str,
        messages: &str,
    ) -> Result<i64> {
        let conn = self.conn.lock();

        conn.execute(
            "INSERT INTO conversations (username, timestamp, messages) VALUES (?1, ?2, ?3)",
            params![user, timestamp, messages],
        )
        .map_err(|e| Error::storage(format!("Failed to save conversation: {}", e)))?;

        Ok(conn.last_insert_rowid())
    }

    /// All decodable transcripts for a user, oldest first
    ///
    /// Rows that neither format can decode are logged and skipped.
    pub fn load_conversations(&self, user: &str) -> Result<Vec<StoredConversation>> {
        let rows = {
            let conn = self.conn.lock();

            let mut stmt = conn
                .prepare(
                    r#"
                    SELECT id, username, timestamp, messages
                    FROM conversations
                    WHERE username = ?1
                    ORDER BY timestamp ASC, id ASC
                    "#,
                )
                .map_err(|e| Error::storage(format!("Failed to prepare query: {}", e)))?;

            let rows: Vec<RawConversationRow> = stmt
                .query_map(params![user], row_to_raw_conversation)
                .map_err(|e| Error::storage(format!("Failed to load conversations: {}", e)))?
                .filter_map(|r| r.ok())
                .collect();
            rows
        };

        Ok(rows.into_iter().filter_map(RawConversationRow::decode).collect())
    }

    /// Sidebar summaries of a user's saved conversations, oldest first
    pub fn list_conversation_summaries(&self, user: &str) -> Result<Vec<ConversationSummary>> {
        Ok(self
            .load_conversations(user)?
            .iter()
            .map(ConversationSummary::from_stored)
            .collect())
    }

    /// Every decodable conversation across all users, oldest first
    pub fn list_all_conversations(&self) -> Result<Vec<StoredConversation>> {
        let rows = {
            let conn = self.conn.lock();

            let mut stmt = conn
                .prepare(
                    r#"
                    SELECT id, username, timestamp, messages
                    FROM conversations
                    ORDER BY timestamp ASC, id ASC
                    "#,
                )
                .map_err(|e| Error::storage(format!("Failed to prepare query: {}", e)))?;

            let rows: Vec<RawConversationRow> = stmt
                .query_map([], row_to_raw_conversation)
                .map_err(|e| Error::storage(format!("Failed to list conversations: {}", e)))?
                .filter_map(|r| r.ok())
                .collect();
            rows
        };

        Ok(rows.into_iter().filter_map(RawConversationRow::decode).collect())
    }

    /// Look up one conversation by row id
    pub fn get_conversation(&self, id: i64) -> Result<Option<StoredConversation>> {
        let conn = self.conn.lock();

        let row = conn
            .query_row(
                "SELECT id, username, timestamp, messages FROM conversations WHERE id = ?1",
                params![id],
                row_to_raw_conversation,
            )
            .optional()
            .map_err(|e| Error::storage(format!("Failed to get conversation: {}", e)))?;

        Ok(row.and_then(RawConversationRow::decode))
    }

    // ==================== Slide Index ====================

    /// Find an indexed deck by content hash
    pub fn find_slide_document_by_hash(&self, content_hash: &str) -> Result<Option<SlideDocument>> {
        let conn = self.conn.lock();

        conn.query_row(
            r#"
            SELECT id, filename, file_type, content_hash, chunk_count, ingested_at
            FROM slide_documents WHERE content_hash = ?1
            "#,
            params![content_hash],
            row_to_slide_document,
        )
        .optional()
        .map_err(|e| Error::storage(format!("Failed to look up slide document: {}", e)))
    }

    /// List indexed decks, newest first
    pub fn list_slide_documents(&self) -> Result<Vec<SlideDocument>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(
                r#"
                SELECT id, filename, file_type, content_hash, chunk_count, ingested_at
                FROM slide_documents ORDER BY ingested_at DESC
                "#,
            )
            .map_err(|e| Error::storage(format!("Failed to prepare query: {}", e)))?;

        let docs = stmt
            .query_map([], row_to_slide_document)
            .map_err(|e| Error::storage(format!("Failed to list slide documents: {}", e)))?
            .filter_map(|r| match r {
                Ok(doc) => Some(doc),
                Err(e) => {
                    tracing::warn!("Skipping unreadable slide document: {}", e);
                    None
                }
            })
            .collect();

        Ok(docs)
    }

    /// Store a deck and its chunks in one transaction
    pub fn insert_slide_document(&self, doc: &SlideDocument, chunks: &[SlideChunk]) -> Result<()> {
        let mut conn = self.conn.lock();

        let tx = conn
            .transaction()
            .map_err(|e| Error::storage(format!("Failed to begin transaction: {}", e)))?;

        tx.execute(
            r#"
            INSERT INTO slide_documents (id, filename, file_type, content_hash, chunk_count, ingested_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                doc.id.to_string(),
                doc.filename,
                doc.file_type.as_str(),
                doc.content_hash,
                doc.chunk_count as i64,
                doc.ingested_at.to_rfc3339(),
            ],
        )
        .map_err(|e| Error::storage(format!("Failed to insert slide document: {}", e)))?;

        {
            let mut stmt = tx
                .prepare(
                    r#"
                    INSERT INTO slide_chunks (id, document_id, chunk_index, content, page_number)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    "#,
                )
                .map_err(|e| Error::storage(format!("Failed to prepare chunk insert: {}", e)))?;

            for chunk in chunks {
                stmt.execute(params![
                    chunk.id.to_string(),
                    chunk.document_id.to_string(),
                    chunk.chunk_index as i64,
                    chunk.content,
                    chunk.page_number.map(|p| p as i64),
                ])
                .map_err(|e| Error::storage(format!("Failed to insert chunk: {}", e)))?;
            }
        }

        tx.commit()
            .map_err(|e| Error::storage(format!("Failed to commit slide document: {}", e)))?;

        tracing::info!("Indexed {} ({} chunks)", doc.filename, chunks.len());
        Ok(())
    }

    /// Delete a deck and its chunks; returns whether it existed
    pub fn delete_slide_document(&self, id: &Uuid) -> Result<bool> {
        let conn = self.conn.lock();

        conn.execute(
            "DELETE FROM slide_chunks WHERE document_id = ?1",
            params![id.to_string()],
        )
        .map_err(|e| Error::storage(format!("Failed to delete chunks: {}", e)))?;

        let deleted = conn
            .execute("DELETE FROM slide_documents WHERE id = ?1", params![id.to_string()])
            .map_err(|e| Error::storage(format!("Failed to delete slide document: {}", e)))?;

        Ok(deleted > 0)
    }

    /// Total number of indexed chunks
    pub fn slide_chunk_count(&self) -> Result<usize> {
        let conn = self.conn.lock();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM slide_chunks", [], |row| row.get(0))
            .map_err(|e| Error::storage(format!("Failed to count chunks: {}", e)))?;

        Ok(count as usize)
    }

    /// Full-text search over slide chunks, best match first
    ///
    /// The query is reduced to its significant terms, OR-ed together and
    /// ranked with BM25.
    pub fn search_slide_chunks(&self, query: &str, limit: usize) -> Result<Vec<RetrievedSnippet>> {
        let Some(fts_query) = build_fts_query(query) else {
            return Ok(Vec::new());
        };

        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(
                r#"
                SELECT c.content, d.filename, c.page_number, bm25(slide_chunks_fts) AS score
                FROM slide_chunks_fts f
                JOIN slide_chunks c ON c.rowid = f.rowid
                JOIN slide_documents d ON d.id = c.document_id
                WHERE slide_chunks_fts MATCH ?1
                ORDER BY score
                LIMIT ?2
                "#,
            )
            .map_err(|e| Error::retrieval(format!("Failed to prepare FTS query: {}", e)))?;

        let results = stmt
            .query_map(params![fts_query, limit as i64], |row| {
                let content: String = row.get(0)?;
                let filename: String = row.get(1)?;
                let page_number: Option<i64> = row.get(2)?;
                let score: f64 = row.get(3)?;

                let source = match page_number {
                    Some(page) => format!("{}, Page {}", filename, page),
                    None => filename,
                };

                Ok(RetrievedSnippet {
                    text: content,
                    source,
                    score: -score, // BM25 is negative, lower is better
                })
            })
            .map_err(|e| Error::retrieval(format!("Failed to execute FTS query: {}", e)))?;

        let mut snippets = Vec::new();
        for result in results {
            match result {
                Ok(snippet) => snippets.push(snippet),
                Err(e) => tracing::warn!("Error reading search result: {}", e),
            }
        }

        Ok(snippets)
    }
}

/// Turn free text into an FTS5 OR query over quoted significant terms
fn build_fts_query(query: &str) -> Option<String> {
    let mut seen = HashSet::new();
    let terms: Vec<String> = query
        .split(|c: char| !c.is_alphanumeric())
        .map(|t| t.to_lowercase())
        .filter(|t| t.chars().count() >= 3 && !STOPWORDS.contains(&t.as_str()))
        .filter(|t| seen.insert(t.clone()))
        .take(MAX_QUERY_TERMS)
        .map(|t| format!("\"{}\"", t))
        .collect();

    (!terms.is_empty()).then(|| terms.join(" OR "))
}

pub(crate) fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp, accepting the column layout or RFC 3339
pub(crate) fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .or_else(|_| DateTime::parse_from_rfc3339(text).map(|d| d.with_timezone(&Utc)))
        .ok()
}

/// Read a timestamp column; unparseable text is a conversion error
fn timestamp_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    parse_timestamp(&text).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("unrecognized timestamp '{}'", text).into(),
        )
    })
}

struct RawConversationRow {
    id: i64,
    user: String,
    timestamp: String,
    messages: Option<String>,
}

impl RawConversationRow {
    fn decode(self) -> Option<StoredConversation> {
        let Some(timestamp) = parse_timestamp(&self.timestamp) else {
            tracing::warn!(
                "Skipping conversation {} for {}: unrecognized timestamp '{}'",
                self.id,
                self.user,
                self.timestamp
            );
            return None;
        };

        let raw = self.messages.unwrap_or_default();
        match transcript_codec::decode(&raw) {
            Ok(decoded) => Some(StoredConversation {
                id: self.id,
                user: self.user,
                timestamp,
                format: decoded.format,
                transcript: decoded.transcript,
            }),
            Err(e) => {
                tracing::warn!("Skipping conversation {} for {}: {}", self.id, self.user, e);
                None
            }
        }
    }
}

fn row_to_raw_conversation(row: &rusqlite::Row) -> rusqlite::Result<RawConversationRow> {
    Ok(RawConversationRow {
        id: row.get(0)?,
        user: row.get(1)?,
        timestamp: row.get(2)?,
        messages: row.get(3)?,
    })
}

fn row_to_grade_record(row: &rusqlite::Row) -> rusqlite::Result<GradeRecord> {
    let grade: String = row.get(3)?;

    Ok(GradeRecord {
        id: row.get(0)?,
        user: row.get(1)?,
        timestamp: timestamp_column(row, 2)?,
        grade: Grade::from_stored(&grade),
        questions: row.get(4)?,
        feedback: row.get(5)?,
    })
}

fn row_to_slide_document(row: &rusqlite::Row) -> rusqlite::Result<SlideDocument> {
    let id_str: String = row.get(0)?;
    let file_type: String = row.get(2)?;
    let chunk_count: i64 = row.get(4)?;
    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(SlideDocument {
        id,
        filename: row.get(1)?,
        file_type: SlideFileType::from_extension(&file_type),
        content_hash: row.get(3)?,
        chunk_count: chunk_count as usize,
        ingested_at: timestamp_column(row, 5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Letter, Message, Modifier, TranscriptFormat};
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()
    }

    fn transcript(question: &str) -> Transcript {
        vec![
            Message::system("hidden context"),
            Message::assistant("Hi"),
            Message::user(question),
            Message::assistant("answer"),
        ]
        .into()
    }

    #[test]
    fn test_save_and_list_grades() {
        let db = CoachDb::in_memory().unwrap();
        let questions = vec!["q1".to_string(), "q2".to_string()];

        let saved = db
            .save_grade("alice", Grade::Letter(Letter::B, Some(Modifier::Plus)), &questions, "ok")
            .unwrap();
        db.save_grade("alice", Grade::NeedsReview, &questions, "raw text").unwrap();

        let records = db.list_grade_records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, saved.id);
        assert_eq!(records[0].questions, "q1\nq2");
        assert_eq!(records[0].grade.to_string(), "B+");
        assert_eq!(records[1].grade, Grade::NeedsReview);
    }

    #[test]
    fn test_record_session_writes_both_rows() {
        let db = CoachDb::in_memory().unwrap();
        let questions = vec!["What tolerance does the lathe hold?".to_string()];

        let record = db
            .record_session("hana", &transcript(&questions[0]), Grade::NeedsReview, &questions, "raw")
            .unwrap();

        assert_eq!(db.list_grade_records().unwrap()[0].id, record.id);
        let saved = db.load_conversations("hana").unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].transcript.user_questions(), questions);
    }

    #[test]
    fn test_conversation_round_trip() {
        let db = CoachDb::in_memory().unwrap();
        let sent = transcript("What tolerance does the lathe hold?");

        db.save_conversation("bob", &sent).unwrap();

        let loaded = db.load_conversations("bob").unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].format, TranscriptFormat::Structured);
        assert_eq!(loaded[0].transcript, sent.without_system());
        assert!(db.load_conversations("nobody").unwrap().is_empty());
    }

    #[test]
    fn test_conversations_ascending_by_timestamp() {
        let db = CoachDb::in_memory().unwrap();
        db.save_conversation_at("carol", &transcript("second"), at(12)).unwrap();
        db.save_conversation_at("carol", &transcript("first"), at(9)).unwrap();

        let loaded = db.load_conversations("carol").unwrap();
        let previews: Vec<String> = loaded.iter().map(|c| c.transcript.preview(40)).collect();
        assert_eq!(previews, vec!["first", "second"]);
    }

    #[test]
    fn test_malformed_row_skipped() {
        let db = CoachDb::in_memory().unwrap();
        db.save_conversation_at("dave", &transcript("good"), at(10)).unwrap();
        db.insert_raw_conversation("dave", "2024-03-01 11:00:00", "garbage-not-json").unwrap();

        let loaded = db.load_conversations("dave").unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].transcript.user_questions(), vec!["good"]);
    }

    #[test]
    fn test_unparseable_timestamp_skipped() {
        let db = CoachDb::in_memory().unwrap();
        db.save_conversation_at("hana", &transcript("kept"), at(9)).unwrap();
        let bad_id = db
            .insert_raw_conversation("hana", "last tuesday", r#"[{"role":"user","content":"lost"}]"#)
            .unwrap();

        let loaded = db.load_conversations("hana").unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].timestamp, at(9));
        assert!(db.get_conversation(bad_id).unwrap().is_none());

        db.save_grade_at("hana", Grade::Letter(Letter::A, None), &[], "fine", at(9)).unwrap();
        db.conn
            .lock()
            .execute(
                "INSERT INTO grade_records (username, timestamp, grade, questions, feedback) \
                 VALUES ('hana', 'not a time', 'C', '', '')",
                [],
            )
            .unwrap();

        let grades = db.list_grade_records().unwrap();
        assert_eq!(grades.len(), 1);
        assert_eq!(grades[0].timestamp, at(9));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert_eq!(parse_timestamp("2024-03-01 08:00:00"), Some(at(8)));
        assert_eq!(parse_timestamp("2024-03-01T08:00:00+00:00"), Some(at(8)));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_summaries_and_all_conversations() {
        let db = CoachDb::in_memory().unwrap();
        let long = "How is the stamping die aligned before each production run?";
        db.save_conversation_at("frank", &transcript(long), at(7)).unwrap();
        db.save_conversation_at("gina", &transcript("short"), at(8)).unwrap();

        let summaries = db.list_conversation_summaries("frank").unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].preview, format!("{}...", &long[..40]));
        assert_eq!(summaries[0].message_count, 3);

        let all = db.list_all_conversations().unwrap();
        let users: Vec<&str> = all.iter().map(|c| c.user.as_str()).collect();
        assert_eq!(users, vec!["frank", "gina"]);
    }

    #[test]
    fn test_legacy_row_loaded() {
        let db = CoachDb::in_memory().unwrap();
        let id = db
            .insert_raw_conversation(
                "erin",
                "2024-03-01 08:00:00",
                "assistant: Hi\nuser: How often is the die replaced?",
            )
            .unwrap();

        let loaded = db.get_conversation(id).unwrap().unwrap();
        assert_eq!(loaded.format, TranscriptFormat::Legacy);
        assert_eq!(loaded.timestamp, at(8));
        assert_eq!(loaded.transcript.len(), 2);
    }

    #[test]
    fn test_slide_search() {
        let db = CoachDb::in_memory().unwrap();
        let doc = SlideDocument {
            id: Uuid::new_v4(),
            filename: "week3.pdf".to_string(),
            file_type: SlideFileType::Pdf,
            content_hash: "abc".to_string(),
            chunk_count: 2,
            ingested_at: Utc::now(),
        };
        let chunks = vec![
            SlideChunk::new(doc.id, 0, "Lathe tolerance is typically 0.02mm.".to_string(), Some(4)),
            SlideChunk::new(doc.id, 1, "Stamping dies are reground regularly.".to_string(), Some(5)),
        ];
        db.insert_slide_document(&doc, &chunks).unwrap();

        let results = db.search_slide_chunks("What tolerance does the lathe hold?", 3).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "week3.pdf, Page 4");

        assert!(db.find_slide_document_by_hash("abc").unwrap().is_some());
        assert_eq!(db.slide_chunk_count().unwrap(), 2);

        assert!(db.delete_slide_document(&doc.id).unwrap());
        assert!(db.search_slide_chunks("lathe", 3).unwrap().is_empty());
    }

    #[test]
    fn test_fts_query_building() {
        assert_eq!(
            build_fts_query("What is the die \"wear\" rate?").as_deref(),
            Some("\"die\" OR \"wear\" OR \"rate\"")
        );
        assert_eq!(build_fts_query("is it?"), None);
    }
}
