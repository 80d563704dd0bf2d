use anyhow::Result;
use chrono::{Duration, Utc};
use uuid::Uuid;

use lux_server::db::repositories::{
    CategoryRepository, CommentRepository, CompanyRepository, InvestmentRepository,
    LikeRepository, PostRepository,
};
use lux_server::db::Database;
use lux_server::ranking;
use lux_types::{Category, Comment, Company, Investment, Post};

fn test_db() -> Result<Database> {
    let db = Database::in_memory()?;
    db.initialize()?;
    Ok(db)
}

fn seed_category(db: &Database, name: &str) -> Result<Category> {
    let category = Category {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: None,
    };
    CategoryRepository::new(db.pool.clone()).create(&category)?;
    Ok(category)
}

fn register_company(db: &Database, name: &str, category_id: Option<Uuid>) -> Result<Company> {
    let company = Company {
        id: Uuid::new_v4(),
        name: name.to_string(),
        category_id,
        created_at: Utc::now(),
    };
    CompanyRepository::new(db.pool.clone()).create(&company, "not-a-real-hash")?;
    Ok(company)
}

fn publish_post(
    db: &Database,
    company: &Company,
    category: &Category,
    title: &str,
    content: &str,
) -> Result<Post> {
    let post = Post {
        id: Uuid::new_v4(),
        company_id: company.id,
        company_name: company.name.clone(),
        category_id: category.id,
        title: title.to_string(),
        content: content.to_string(),
        created_at: Utc::now(),
        likes: 0,
        investment: 0,
        comment_count: 0,
        score: 0.0,
    };
    PostRepository::new(db.pool.clone()).create(&post)?;
    Ok(post)
}

/// A company liking the same post twice must count once.
#[tokio::test]
async fn test_like_is_idempotent_per_company() -> Result<()> {
    let db = test_db()?;
    let category = seed_category(&db, "Fintech")?;
    let author = register_company(&db, "Helios Labs", None)?;
    let fan = register_company(&db, "Vantage Pay", None)?;
    let other = register_company(&db, "Forgeline", None)?;

    // 100 characters so the content factor is exactly 1.0
    let content = "x".repeat(100);
    let post = publish_post(&db, &author, &category, "Launch day", &content)?;

    let likes = LikeRepository::new(db.pool.clone());
    let posts = PostRepository::new(db.pool.clone());

    assert!(likes.like(&post.id, &fan.id)?, "First like should insert");
    assert!(
        !likes.like(&post.id, &fan.id)?,
        "Second like from the same company should be a no-op"
    );
    assert_eq!(likes.count_for_post(&post.id)?, 1);

    let fetched = posts
        .get_by_id(&post.id)?
        .expect("Post should still exist");
    assert_eq!(fetched.likes, 1);
    assert_eq!(fetched.score, 2.0 + 1.0);

    // A different company still counts
    assert!(likes.like(&post.id, &other.id)?);
    let fetched = posts
        .get_by_id(&post.id)?
        .expect("Post should still exist");
    assert_eq!(fetched.likes, 2);
    assert_eq!(fetched.score, 4.0 + 1.0);

    println!("✅ Likes are idempotent per company");
    Ok(())
}

/// Repeat investments from the same company add up instead of replacing
/// each other.
#[tokio::test]
async fn test_repeat_investments_accumulate() -> Result<()> {
    let db = test_db()?;
    let category = seed_category(&db, "Fintech")?;
    let author = register_company(&db, "Helios Labs", None)?;
    let backer = register_company(&db, "Vantage Pay", None)?;

    let content = "x".repeat(100);
    let post = publish_post(&db, &author, &category, "Settlement pilot", &content)?;

    let investments = InvestmentRepository::new(db.pool.clone());
    for _ in 0..2 {
        investments.create(&Investment {
            id: Uuid::new_v4(),
            post_id: post.id,
            company_id: backer.id,
            amount: 5,
            created_at: Utc::now(),
        })?;
    }

    assert_eq!(investments.total_for_post(&post.id)?, 10);

    let fetched = PostRepository::new(db.pool.clone())
        .get_by_id(&post.id)?
        .expect("Post should still exist");
    assert_eq!(fetched.investment, 10);
    assert_eq!(fetched.score, 30.0 + 1.0);

    println!("✅ Investments accumulate across calls");
    Ok(())
}

/// Comments are listed oldest first and feed the post score.
#[tokio::test]
async fn test_comments_feed_the_post_score() -> Result<()> {
    let db = test_db()?;
    let category = seed_category(&db, "Developer Tools")?;
    let author = register_company(&db, "Forgeline", None)?;
    let reader = register_company(&db, "Quietwire", None)?;

    let content = "x".repeat(100);
    let post = publish_post(&db, &author, &category, "Pipelines go public", &content)?;

    let comments = CommentRepository::new(db.pool.clone());
    let base = Utc::now();
    let bodies = ["First impressions", "Second pass", "Still holds up"];
    for (i, body) in bodies.iter().enumerate() {
        comments.create(&Comment {
            id: Uuid::new_v4(),
            post_id: post.id,
            company_id: reader.id,
            company_name: reader.name.clone(),
            content: body.to_string(),
            created_at: base + Duration::seconds(i as i64),
        })?;
    }

    let thread = comments.list_by_post(&post.id)?;
    assert_eq!(thread.len(), 3);
    assert_eq!(thread[0].content, "First impressions");
    assert_eq!(thread[2].content, "Still holds up");
    assert_eq!(thread[0].company_name, "Quietwire");

    let fetched = PostRepository::new(db.pool.clone())
        .get_by_id(&post.id)?
        .expect("Post should still exist");
    assert_eq!(fetched.comment_count, 3);
    assert_eq!(fetched.score, 3.0 + 1.0);

    println!("✅ Comment counts flow into the score");
    Ok(())
}

/// The cached engagement columns on the posts table must match the derived
/// values after refresh_engagement runs.
#[tokio::test]
async fn test_refresh_engagement_syncs_cached_columns() -> Result<()> {
    let db = test_db()?;
    let category = seed_category(&db, "Fintech")?;
    let author = register_company(&db, "Helios Labs", None)?;
    let fan = register_company(&db, "Vantage Pay", None)?;

    let content = "x".repeat(100);
    let post = publish_post(&db, &author, &category, "Inference engine", &content)?;

    let posts = PostRepository::new(db.pool.clone());
    LikeRepository::new(db.pool.clone()).like(&post.id, &fan.id)?;
    InvestmentRepository::new(db.pool.clone()).create(&Investment {
        id: Uuid::new_v4(),
        post_id: post.id,
        company_id: fan.id,
        amount: 7,
        created_at: Utc::now(),
    })?;
    posts.refresh_engagement(&post.id)?;

    let conn = db.connection()?;
    let (cached_likes, cached_investment, cached_score): (i64, i64, f64) = conn.query_row(
        "SELECT likes, investment, score FROM posts WHERE id = ?",
        [post.id.to_string()],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;

    let fetched = posts
        .get_by_id(&post.id)?
        .expect("Post should still exist");
    assert_eq!(cached_likes, fetched.likes);
    assert_eq!(cached_investment, fetched.investment);
    assert_eq!(cached_score, fetched.score);
    assert_eq!(cached_score, 2.0 + 21.0 + 1.0);

    println!("✅ Cached columns track the derived engagement");
    Ok(())
}

/// Deleting a category removes its posts and their engagement, while the
/// companies assigned to it survive with the assignment cleared.
#[tokio::test]
async fn test_delete_category_removes_posts_and_keeps_companies() -> Result<()> {
    let db = test_db()?;
    let doomed = seed_category(&db, "Fintech")?;
    let survivor = seed_category(&db, "Developer Tools")?;
    let company = register_company(&db, "Vantage Pay", Some(doomed.id))?;
    let fan = register_company(&db, "Quietwire", None)?;

    let in_doomed = publish_post(&db, &company, &doomed, "Settlement pilot", "body")?;
    let in_survivor = publish_post(&db, &company, &survivor, "Side project", "body")?;

    LikeRepository::new(db.pool.clone()).like(&in_doomed.id, &fan.id)?;
    CommentRepository::new(db.pool.clone()).create(&Comment {
        id: Uuid::new_v4(),
        post_id: in_doomed.id,
        company_id: fan.id,
        company_name: fan.name.clone(),
        content: "Watching this one".to_string(),
        created_at: Utc::now(),
    })?;

    CategoryRepository::new(db.pool.clone()).delete_cascade(&doomed.id)?;

    let posts = PostRepository::new(db.pool.clone());
    assert!(
        posts.get_by_id(&in_doomed.id)?.is_none(),
        "Posts in the deleted category should be gone"
    );
    assert!(
        posts.get_by_id(&in_survivor.id)?.is_some(),
        "Posts in other categories should survive"
    );

    let refreshed = CompanyRepository::new(db.pool.clone())
        .get_by_id(&company.id)?
        .expect("Company should survive the category delete");
    assert_eq!(refreshed.category_id, None);

    // Engagement rows cascade away with the post
    let conn = db.connection()?;
    let like_rows: i64 = conn.query_row(
        "SELECT COUNT(*) FROM likes WHERE post_id = ?",
        [in_doomed.id.to_string()],
        |row| row.get(0),
    )?;
    let comment_rows: i64 = conn.query_row(
        "SELECT COUNT(*) FROM comments WHERE post_id = ?",
        [in_doomed.id.to_string()],
        |row| row.get(0),
    )?;
    assert_eq!(like_rows, 0);
    assert_eq!(comment_rows, 0);

    println!("✅ Category delete cascades posts and clears assignments");
    Ok(())
}

/// The Top list drops companies under the aggregate threshold and orders
/// the rest by aggregate.
#[tokio::test]
async fn test_top_list_applies_threshold_and_ordering() -> Result<()> {
    let db = test_db()?;
    let category = seed_category(&db, "Fintech")?;

    let argo = register_company(&db, "Argo Systems", None)?;
    let brill = register_company(&db, "Brill Works", None)?;
    let cinder = register_company(&db, "Cinder Co", None)?;
    register_company(&db, "Drift Null", None)?;

    let argo_post = publish_post(&db, &argo, &category, "Funding round", "x")?;
    let brill_post = publish_post(&db, &brill, &category, "New release", "x")?;
    // Cinder's post never picks up engagement, 0.01 stays under the bar
    publish_post(&db, &cinder, &category, "Quiet update", "x")?;

    InvestmentRepository::new(db.pool.clone()).create(&Investment {
        id: Uuid::new_v4(),
        post_id: argo_post.id,
        company_id: brill.id,
        amount: 2,
        created_at: Utc::now(),
    })?;
    LikeRepository::new(db.pool.clone()).like(&brill_post.id, &argo.id)?;

    let companies = CompanyRepository::new(db.pool.clone()).list_all()?;
    let posts = PostRepository::new(db.pool.clone()).list_all()?;
    let top = ranking::top_companies(companies, &posts);

    assert_eq!(top.len(), 2, "Only companies at or above 1.0 qualify");
    assert_eq!(top[0].company.name, "Argo Systems");
    assert_eq!(top[0].aggregate, 6.01);
    assert_eq!(top[1].company.name, "Brill Works");
    assert_eq!(top[1].aggregate, 2.01);

    println!("✅ Top list honors the threshold and ordering");
    Ok(())
}

/// Deleting a post takes its engagement rows and its score contribution
/// with it.
#[tokio::test]
async fn test_deleting_a_post_drops_its_engagement() -> Result<()> {
    let db = test_db()?;
    let category = seed_category(&db, "Fintech")?;
    let author = register_company(&db, "Helios Labs", None)?;
    let fan = register_company(&db, "Vantage Pay", None)?;

    let keeper = publish_post(&db, &author, &category, "Keeper", &"x".repeat(100))?;
    let doomed = publish_post(&db, &author, &category, "Doomed", &"x".repeat(100))?;

    let likes = LikeRepository::new(db.pool.clone());
    likes.like(&doomed.id, &fan.id)?;
    likes.like(&keeper.id, &fan.id)?;

    let posts = PostRepository::new(db.pool.clone());
    posts.delete(&doomed.id)?;

    assert!(posts.get_by_id(&doomed.id)?.is_none());

    let conn = db.connection()?;
    let like_rows: i64 = conn.query_row(
        "SELECT COUNT(*) FROM likes WHERE post_id = ?",
        [doomed.id.to_string()],
        |row| row.get(0),
    )?;
    assert_eq!(like_rows, 0, "Likes should cascade with the post");

    let remaining = posts.list_by_company(&author.id)?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(ranking::aggregate_score(&remaining), 2.0 + 1.0);

    println!("✅ Post deletion removes engagement and score contribution");
    Ok(())
}
