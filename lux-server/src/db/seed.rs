use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use uuid::Uuid;

use lux_types::{Category, Comment, Company, Investment, Message, Post};

use crate::credential::hash_password;
use crate::db::repositories::{
    CategoryRepository, CommentRepository, CompanyRepository, InvestmentRepository,
    LikeRepository, MessageRepository, PostRepository,
};
use crate::db::Database;

/// Password shared by every seeded demo company
pub const DEMO_PASSWORD: &str = "lux-demo";

/// Seed a fresh database with demo categories, companies and activity.
///
/// Runs on startup and backs off as soon as any company exists, so a
/// database that has seen real registrations is never touched. Seeding
/// happens at runtime rather than as a SQL batch because credential hashes
/// are salted per company.
pub fn seed_demo_data(db: &Database) -> Result<()> {
    let conn = db.connection()?;
    let company_count: i64 =
        conn.query_row("SELECT COUNT(*) FROM companies", [], |row| row.get(0))?;
    if company_count > 0 {
        return Ok(());
    }
    drop(conn);

    let categories = CategoryRepository::new(db.pool.clone());
    let companies = CompanyRepository::new(db.pool.clone());
    let posts = PostRepository::new(db.pool.clone());
    let likes = LikeRepository::new(db.pool.clone());
    let investments = InvestmentRepository::new(db.pool.clone());
    let comments = CommentRepository::new(db.pool.clone());
    let messages = MessageRepository::new(db.pool.clone());

    let now = Utc::now();

    let ai = Category {
        id: Uuid::new_v4(),
        name: "Artificial Intelligence".to_string(),
        description: Some("Models, agents and the companies building them".to_string()),
    };
    let fintech = Category {
        id: Uuid::new_v4(),
        name: "Fintech".to_string(),
        description: Some("Payments, banking and markets".to_string()),
    };
    let devtools = Category {
        id: Uuid::new_v4(),
        name: "Developer Tools".to_string(),
        description: None,
    };
    categories.create(&ai)?;
    categories.create(&fintech)?;
    categories.create(&devtools)?;

    let helios = Company {
        id: Uuid::new_v4(),
        name: "Helios Labs".to_string(),
        category_id: Some(ai.id),
        created_at: now - Duration::days(30),
    };
    let vantage = Company {
        id: Uuid::new_v4(),
        name: "Vantage Pay".to_string(),
        category_id: Some(fintech.id),
        created_at: now - Duration::days(25),
    };
    let forgeline = Company {
        id: Uuid::new_v4(),
        name: "Forgeline".to_string(),
        category_id: Some(devtools.id),
        created_at: now - Duration::days(20),
    };
    let quietwire = Company {
        id: Uuid::new_v4(),
        name: "Quietwire".to_string(),
        category_id: None,
        created_at: now - Duration::days(10),
    };
    for company in [&helios, &vantage, &forgeline, &quietwire] {
        let hash = hash_password(DEMO_PASSWORD)
            .with_context(|| format!("Failed to hash demo credential for {}", company.name))?;
        companies.create(company, &hash)?;
    }

    let demo_post = |company: &Company, category: &Category, title: &str, content: &str, days_ago: i64| Post {
        id: Uuid::new_v4(),
        company_id: company.id,
        company_name: company.name.clone(),
        category_id: category.id,
        title: title.to_string(),
        content: content.to_string(),
        created_at: now - Duration::days(days_ago),
        likes: 0,
        investment: 0,
        comment_count: 0,
        score: 0.0,
    };

    let launch = demo_post(
        &helios,
        &ai,
        "Helios v2 inference engine",
        "Our second generation inference engine cuts latency in half on commodity hardware. \
         Early access starts next week for everyone on the waitlist.",
        7,
    );
    let retrieval = demo_post(
        &helios,
        &ai,
        "Retrieval that survives production",
        "Lessons from a year of running retrieval pipelines for customers with messy data.",
        4,
    );
    let settlement = demo_post(
        &vantage,
        &fintech,
        "Instant settlement pilot",
        "We are piloting instant settlement with three regional banks this quarter.",
        5,
    );
    let pipelines = demo_post(
        &forgeline,
        &devtools,
        "Forgeline pipelines go public",
        "Build pipelines as code, with caching that actually works.",
        2,
    );
    for post in [&launch, &retrieval, &settlement, &pipelines] {
        posts.create(post)?;
    }

    likes.like(&launch.id, &vantage.id)?;
    likes.like(&launch.id, &forgeline.id)?;
    likes.like(&launch.id, &quietwire.id)?;
    likes.like(&settlement.id, &helios.id)?;
    likes.like(&pipelines.id, &helios.id)?;
    likes.like(&pipelines.id, &vantage.id)?;

    investments.create(&Investment {
        id: Uuid::new_v4(),
        post_id: launch.id,
        company_id: vantage.id,
        amount: 40,
        created_at: now - Duration::days(6),
    })?;
    investments.create(&Investment {
        id: Uuid::new_v4(),
        post_id: pipelines.id,
        company_id: quietwire.id,
        amount: 15,
        created_at: now - Duration::days(1),
    })?;

    comments.create(&Comment {
        id: Uuid::new_v4(),
        post_id: launch.id,
        company_id: forgeline.id,
        company_name: forgeline.name.clone(),
        content: "Benchmarks look strong. Which hardware did you test on?".to_string(),
        created_at: now - Duration::days(6),
    })?;
    comments.create(&Comment {
        id: Uuid::new_v4(),
        post_id: launch.id,
        company_id: quietwire.id,
        company_name: quietwire.name.clone(),
        content: "Signed up for early access.".to_string(),
        created_at: now - Duration::days(5),
    })?;
    comments.create(&Comment {
        id: Uuid::new_v4(),
        post_id: settlement.id,
        company_id: helios.id,
        company_name: helios.name.clone(),
        content: "Curious how you handle reconciliation failures.".to_string(),
        created_at: now - Duration::days(4),
    })?;

    messages.create(&Message {
        id: Uuid::new_v4(),
        sender_id: helios.id,
        receiver_id: vantage.id,
        sender_name: helios.name.clone(),
        receiver_name: vantage.name.clone(),
        content: "Interested in running your fraud models on our inference stack?".to_string(),
        created_at: now - Duration::days(3),
    })?;
    messages.create(&Message {
        id: Uuid::new_v4(),
        sender_id: vantage.id,
        receiver_id: helios.id,
        sender_name: vantage.name.clone(),
        receiver_name: helios.name.clone(),
        content: "Yes, send over the integration docs.".to_string(),
        created_at: now - Duration::days(3) + Duration::hours(2),
    })?;

    // Bring the cached engagement columns in line with the seeded activity
    for post in [&launch, &retrieval, &settlement, &pipelines] {
        posts.refresh_engagement(&post.id)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_populates_fresh_database() {
        let db = Database::in_memory().expect("Failed to create database");
        db.initialize().expect("Failed to initialize schema");
        seed_demo_data(&db).expect("Failed to seed");

        let conn = db.connection().expect("Failed to get connection");
        let companies: i64 = conn
            .query_row("SELECT COUNT(*) FROM companies", [], |row| row.get(0))
            .expect("Failed to count companies");
        let posts: i64 = conn
            .query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))
            .expect("Failed to count posts");

        assert_eq!(companies, 4);
        assert_eq!(posts, 4);
    }

    #[test]
    fn test_seed_skips_populated_database() {
        let db = Database::in_memory().expect("Failed to create database");
        db.initialize().expect("Failed to initialize schema");
        seed_demo_data(&db).expect("Failed to seed");
        seed_demo_data(&db).expect("Second seed should be a no-op");

        let conn = db.connection().expect("Failed to get connection");
        let companies: i64 = conn
            .query_row("SELECT COUNT(*) FROM companies", [], |row| row.get(0))
            .expect("Failed to count companies");
        assert_eq!(companies, 4);
    }

    #[test]
    fn test_seeded_scores_reflect_engagement() {
        let db = Database::in_memory().expect("Failed to create database");
        db.initialize().expect("Failed to initialize schema");
        seed_demo_data(&db).expect("Failed to seed");

        let posts = PostRepository::new(db.pool.clone());
        let all = posts.list_all().expect("Failed to list posts");
        let launch = all
            .iter()
            .find(|p| p.title == "Helios v2 inference engine")
            .expect("Seeded post missing");

        assert_eq!(launch.likes, 3);
        assert_eq!(launch.investment, 40);
        assert_eq!(launch.comment_count, 2);
        assert!(launch.score > 126.0, "score was {}", launch.score);
    }
}
