use anyhow::{Context, Result};
use clap::Parser;
use lux_server::db::Database;
use lux_server::score::compute_score;
use uuid::Uuid;

/// Lux Score Backfill Utility
///
/// This tool recomputes the cached engagement columns (likes, investment,
/// score) on the posts table from the like, investment and comment rows.
/// The server keeps these columns fresh on every mutation; this tool repairs
/// databases written by older builds or edited by hand.
#[derive(Parser, Debug)]
#[command(name = "lux-migrate")]
#[command(about = "Recompute cached post scores for a Lux database", long_about = None)]
struct Args {
    /// Path to the SQLite database file
    #[arg(short, long, default_value = "./lux.db")]
    database: String,

    /// Perform a dry run without making changes
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Skip confirmation prompt
    #[arg(short = 'y', long)]
    yes: bool,
}

/// Statistics collected during the backfill
#[derive(Debug, Default)]
struct MigrationStats {
    /// Total number of posts processed
    posts_processed: usize,
    /// Posts whose cached columns were out of date
    posts_changed: usize,
    /// Posts whose cached columns already matched the recount
    posts_in_sync: usize,
    /// Errors encountered during the backfill
    errors: Vec<String>,
}

impl MigrationStats {
    /// Create a new empty statistics tracker
    fn new() -> Self {
        Self::default()
    }

    /// Record that a post was processed and whether it needed repair
    fn record_post(&mut self, changed: bool) {
        self.posts_processed += 1;
        if changed {
            self.posts_changed += 1;
        } else {
            self.posts_in_sync += 1;
        }
    }

    /// Record an error
    fn record_error(&mut self, error: String) {
        self.errors.push(error);
    }
}

/// A post row with its cached engagement columns
#[derive(Debug)]
struct PostRow {
    id: Uuid,
    content: String,
    cached_likes: i64,
    cached_investment: i64,
    cached_score: f64,
}

/// Decide whether cached engagement columns diverge from a recount
fn is_stale(post: &PostRow, likes: i64, investment: i64, comment_count: i64) -> bool {
    let expected = compute_score(likes, investment, &post.content, comment_count);
    likes != post.cached_likes
        || investment != post.cached_investment
        || expected != post.cached_score
}

/// Recount a post's engagement from the source-of-truth tables
fn recount_engagement(db: &Database, post_id: &Uuid) -> Result<(i64, i64, i64)> {
    let conn = db
        .pool
        .get()
        .context("Failed to get database connection")?;

    let likes: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM likes WHERE post_id = ?",
            [post_id.to_string()],
            |row| row.get(0),
        )
        .context("Failed to count likes")?;

    let investment: i64 = conn
        .query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM investments WHERE post_id = ?",
            [post_id.to_string()],
            |row| row.get(0),
        )
        .context("Failed to sum investments")?;

    let comment_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM comments WHERE post_id = ?",
            [post_id.to_string()],
            |row| row.get(0),
        )
        .context("Failed to count comments")?;

    Ok((likes, investment, comment_count))
}

/// Process a single post: recount its engagement and repair the cached
/// columns if they diverge. Returns whether the post needed repair.
fn process_post(post: &PostRow, db: &Database, dry_run: bool) -> Result<bool> {
    let (likes, investment, comment_count) = recount_engagement(db, &post.id)?;

    if !is_stale(post, likes, investment, comment_count) {
        return Ok(false);
    }

    if !dry_run {
        let score = compute_score(likes, investment, &post.content, comment_count);
        let conn = db
            .pool
            .get()
            .context("Failed to get database connection")?;
        conn.execute(
            "UPDATE posts SET likes = ?, investment = ?, score = ? WHERE id = ?",
            rusqlite::params![likes, investment, score, post.id.to_string()],
        )
        .with_context(|| format!("Failed to update post {}", post.id))?;
    }

    Ok(true)
}

/// Query all posts with their cached engagement columns
fn query_all_posts(db: &Database) -> Result<Vec<PostRow>> {
    let conn = db
        .pool
        .get()
        .context("Failed to get database connection")?;

    let mut stmt = conn
        .prepare("SELECT id, content, likes, investment, score FROM posts")
        .context("Failed to prepare query")?;

    let posts = stmt
        .query_map([], |row| {
            let id_str: String = row.get(0)?;

            Ok(PostRow {
                id: Uuid::parse_str(&id_str)
                    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?,
                content: row.get(1)?,
                cached_likes: row.get(2)?,
                cached_investment: row.get(3)?,
                cached_score: row.get(4)?,
            })
        })
        .context("Failed to execute query")?
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to collect posts")?;

    Ok(posts)
}

/// Connect to the database and validate schema
fn connect_database(path: &str) -> Result<Database> {
    println!("Connecting to database: {}", path);

    // Check if database file exists
    if !std::path::Path::new(path).exists() {
        anyhow::bail!("Database file not found: {}", path);
    }

    // Open database connection
    let db = Database::new(path).context("Failed to open database connection")?;

    // Validate that the database has the required schema
    let conn = db
        .pool
        .get()
        .context("Failed to get database connection from pool")?;

    for table in ["posts", "likes", "investments", "comments"] {
        let table_exists: bool = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?",
                [table],
                |row| row.get::<_, i32>(0).map(|count| count > 0),
            )
            .with_context(|| format!("Failed to check for {} table", table))?;

        if !table_exists {
            anyhow::bail!("Database schema is invalid - {} table not found", table);
        }
    }

    println!("Database connection successful - schema validated");

    Ok(db)
}

/// Display backfill statistics in a formatted way
fn display_stats(stats: &MigrationStats, dry_run: bool) {
    println!();
    println!("Backfill Summary");
    println!("================");
    println!();
    println!("Posts processed: {}", stats.posts_processed);
    println!("Posts repaired: {}", stats.posts_changed);
    println!("Posts already in sync: {}", stats.posts_in_sync);

    if !stats.errors.is_empty() {
        println!();
        println!("Errors encountered: {}", stats.errors.len());
        for (i, error) in stats.errors.iter().enumerate() {
            println!("  {}. {}", i + 1, error);
        }
    }

    println!();
    if dry_run {
        println!("This was a dry run - no changes were made to the database.");
    } else {
        println!("Backfill completed successfully!");
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    println!("Lux Score Backfill Utility");
    println!("==========================");
    println!();
    println!("Database: {}", args.database);
    println!("Dry run: {}", args.dry_run);
    println!();

    // Connect to database
    let db = connect_database(&args.database)?;

    // Query all posts
    println!("Querying all posts...");
    let posts = query_all_posts(&db)?;
    println!("Found {} posts", posts.len());

    // Handle empty database
    if posts.is_empty() {
        println!("No posts found in database - nothing to backfill.");
        return Ok(());
    }

    // Show confirmation prompt unless --yes flag is provided
    if !args.yes && !args.dry_run {
        println!("This will recompute cached scores for {} posts.", posts.len());
        println!("Do you want to continue? (y/N): ");

        let mut input = String::new();
        std::io::stdin()
            .read_line(&mut input)
            .context("Failed to read user input")?;

        let input = input.trim().to_lowercase();
        if input != "y" && input != "yes" {
            println!("Backfill cancelled.");
            return Ok(());
        }
    }

    // Initialize statistics tracker
    let mut stats = MigrationStats::new();

    // Process each post
    println!();
    println!("Processing posts...");
    for (i, post) in posts.iter().enumerate() {
        // Show progress every 100 posts
        if (i + 1) % 100 == 0 {
            println!("Processed {} / {} posts...", i + 1, posts.len());
        }

        // Process the post
        match process_post(post, &db, args.dry_run) {
            Ok(changed) => stats.record_post(changed),
            Err(e) => {
                // Log error but continue processing
                let error_msg = format!("Error processing post {}: {:#}", post.id, e);
                eprintln!("ERROR: {}", error_msg);
                stats.record_error(error_msg);
            }
        }
    }

    println!("Finished processing {} posts", posts.len());

    // Display stats
    display_stats(&stats, args.dry_run);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rusqlite::params;

    /// Insert a category and company so posts can satisfy their foreign keys
    fn seed_parents(db: &Database) -> (Uuid, Uuid) {
        let conn = db.pool.get().expect("Failed to get connection");
        let category_id = Uuid::new_v4();
        conn.execute(
            "INSERT INTO categories (id, name) VALUES (?, ?)",
            params![category_id.to_string(), "Fintech"],
        )
        .expect("Failed to insert category");

        let company_id = Uuid::new_v4();
        conn.execute(
            "INSERT INTO companies (id, name, credential_hash, created_at) VALUES (?, ?, ?, ?)",
            params![
                company_id.to_string(),
                "Helios Labs",
                "not-a-real-hash",
                "2024-01-01T00:00:00Z"
            ],
        )
        .expect("Failed to insert company");

        (company_id, category_id)
    }

    /// Insert a post with explicitly chosen cached engagement columns
    fn insert_post(
        db: &Database,
        company_id: &Uuid,
        category_id: &Uuid,
        content: &str,
        cached: (i64, i64, f64),
    ) -> Uuid {
        let conn = db.pool.get().expect("Failed to get connection");
        let post_id = Uuid::new_v4();
        conn.execute(
            "INSERT INTO posts (id, company_id, category_id, title, content, created_at, likes, investment, score)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                post_id.to_string(),
                company_id.to_string(),
                category_id.to_string(),
                "Title",
                content,
                "2024-01-01T00:00:00Z",
                cached.0,
                cached.1,
                cached.2
            ],
        )
        .expect("Failed to insert post");
        post_id
    }

    fn insert_like(db: &Database, post_id: &Uuid, company_id: &Uuid) {
        let conn = db.pool.get().expect("Failed to get connection");
        conn.execute(
            "INSERT INTO likes (post_id, company_id, created_at) VALUES (?, ?, ?)",
            params![
                post_id.to_string(),
                company_id.to_string(),
                "2024-01-01T00:00:00Z"
            ],
        )
        .expect("Failed to insert like");
    }

    fn insert_investment(db: &Database, post_id: &Uuid, company_id: &Uuid, amount: i64) {
        let conn = db.pool.get().expect("Failed to get connection");
        conn.execute(
            "INSERT INTO investments (id, post_id, company_id, amount, created_at) VALUES (?, ?, ?, ?, ?)",
            params![
                Uuid::new_v4().to_string(),
                post_id.to_string(),
                company_id.to_string(),
                amount,
                "2024-01-01T00:00:00Z"
            ],
        )
        .expect("Failed to insert investment");
    }

    // A backfill run must leave every cached column equal to the recount.
    #[test]
    fn test_backfill_repairs_stale_columns() {
        let db = Database::in_memory().expect("Failed to create in-memory database");
        db.initialize().expect("Failed to initialize database");

        let (company_id, category_id) = seed_parents(&db);

        // Stale post: one like and an investment of 4, but zeroed cache
        let stale_id = insert_post(&db, &company_id, &category_id, "body", (0, 0, 0.0));
        insert_like(&db, &stale_id, &company_id);
        insert_investment(&db, &stale_id, &company_id, 4);

        // Fresh post: cache matches its (empty) engagement
        let fresh_score = compute_score(0, 0, "body", 0);
        insert_post(&db, &company_id, &category_id, "body", (0, 0, fresh_score));

        let posts = query_all_posts(&db).expect("Failed to query posts");
        assert_eq!(posts.len(), 2);

        let mut stats = MigrationStats::new();
        for post in &posts {
            let changed = process_post(post, &db, false).expect("Failed to process post");
            stats.record_post(changed);
        }

        assert_eq!(stats.posts_processed, 2, "All posts should be processed");
        assert_eq!(stats.posts_changed, 1, "Only the stale post needs repair");
        assert_eq!(stats.posts_in_sync, 1);

        let conn = db.pool.get().expect("Failed to get connection");
        let (likes, investment, score): (i64, i64, f64) = conn
            .query_row(
                "SELECT likes, investment, score FROM posts WHERE id = ?",
                [stale_id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .expect("Failed to read repaired post");

        assert_eq!(likes, 1);
        assert_eq!(investment, 4);
        assert_eq!(score, compute_score(1, 4, "body", 0));
    }

    // Running the backfill twice must report zero repairs the second time.
    #[test]
    fn test_backfill_is_idempotent() {
        let db = Database::in_memory().expect("Failed to create in-memory database");
        db.initialize().expect("Failed to initialize database");

        let (company_id, category_id) = seed_parents(&db);
        let post_id = insert_post(&db, &company_id, &category_id, "body", (5, 5, 999.0));
        insert_like(&db, &post_id, &company_id);

        // First run repairs
        let posts = query_all_posts(&db).expect("Failed to query posts");
        let changed = process_post(&posts[0], &db, false).expect("Failed to process post");
        assert!(changed, "First run should repair the cache");

        // Second run finds nothing to do
        let posts = query_all_posts(&db).expect("Failed to query posts");
        let changed = process_post(&posts[0], &db, false).expect("Failed to process post");
        assert!(!changed, "Second run should find the cache in sync");
    }

    // A dry run must report repairs without writing any.
    #[test]
    fn test_dry_run_leaves_database_untouched() {
        let db = Database::in_memory().expect("Failed to create in-memory database");
        db.initialize().expect("Failed to initialize database");

        let (company_id, category_id) = seed_parents(&db);
        let post_id = insert_post(&db, &company_id, &category_id, "body", (0, 0, 0.0));
        insert_like(&db, &post_id, &company_id);

        let posts = query_all_posts(&db).expect("Failed to query posts");
        let changed = process_post(&posts[0], &db, true).expect("Failed to process post");
        assert!(changed, "Dry run should still detect the stale cache");

        let conn = db.pool.get().expect("Failed to get connection");
        let (likes, score): (i64, f64) = conn
            .query_row(
                "SELECT likes, score FROM posts WHERE id = ?",
                [post_id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .expect("Failed to read post");

        assert_eq!(likes, 0, "Dry run must not write the recount");
        assert_eq!(score, 0.0, "Dry run must not write the score");
    }

    proptest! {
        // A cache written from a recount is never stale against that recount.
        #[test]
        fn prop_fresh_cache_is_never_stale(
            likes in 0i64..10_000,
            investment in 0i64..100_000,
            comments in 0i64..10_000,
            content in ".{0,300}"
        ) {
            let post = PostRow {
                id: Uuid::new_v4(),
                content: content.clone(),
                cached_likes: likes,
                cached_investment: investment,
                cached_score: compute_score(likes, investment, &content, comments),
            };
            prop_assert!(!is_stale(&post, likes, investment, comments));
        }

        // Any divergence in the counters marks the cache stale.
        #[test]
        fn prop_counter_drift_is_stale(
            likes in 0i64..10_000,
            investment in 0i64..100_000,
            comments in 0i64..10_000,
            drift in 1i64..100,
            content in ".{0,300}"
        ) {
            let post = PostRow {
                id: Uuid::new_v4(),
                content: content.clone(),
                cached_likes: likes + drift,
                cached_investment: investment,
                cached_score: compute_score(likes, investment, &content, comments),
            };
            prop_assert!(is_stale(&post, likes, investment, comments));
        }
    }
}
