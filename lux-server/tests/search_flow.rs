use anyhow::Result;
use chrono::{Duration, Utc};
use uuid::Uuid;

use lux_server::db::repositories::{CategoryRepository, CompanyRepository, PostRepository};
use lux_server::db::Database;
use lux_server::ranking;
use lux_server::search::{self, ParsedQuery, QueryError};
use lux_types::{Category, Company, Post};

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

fn register_company(db: &Database, name: &str) -> Result<Company> {
    let company = Company {
        id: Uuid::new_v4(),
        name: name.to_string(),
        category_id: None,
        created_at: Utc::now(),
    };
    CompanyRepository::new(db.pool.clone()).create(&company, "not-a-real-hash")?;
    Ok(company)
}

fn publish_post_at(
    db: &Database,
    company: &Company,
    category: &Category,
    title: &str,
    created_at: chrono::DateTime<Utc>,
) -> Result<Post> {
    let post = Post {
        id: Uuid::new_v4(),
        company_id: company.id,
        company_name: company.name.clone(),
        category_id: category.id,
        title: title.to_string(),
        content: "body".to_string(),
        created_at,
        likes: 0,
        investment: 0,
        comment_count: 0,
        score: 0.0,
    };
    PostRepository::new(db.pool.clone()).create(&post)?;
    Ok(post)
}

/// A blank query is the browse case: every company comes back, ranked.
#[tokio::test]
async fn test_blank_query_returns_all_companies_ranked() -> Result<()> {
    let db = test_db()?;
    let category = seed_category(&db, "Fintech")?;
    let helios = register_company(&db, "Helios Labs")?;
    let vantage = register_company(&db, "Vantage Pay")?;
    publish_post_at(&db, &helios, &category, "Inference engine", Utc::now())?;
    publish_post_at(&db, &vantage, &category, "Settlement pilot", Utc::now())?;

    assert_eq!(search::parse("   "), ParsedQuery::Empty);

    let companies = CompanyRepository::new(db.pool.clone()).list_all()?;
    let posts = PostRepository::new(db.pool.clone()).list_all()?;
    let ranked = ranking::rank(companies, &posts, None);

    assert_eq!(ranked.len(), 2);
    assert!(ranked.iter().all(|r| r.post_count == 1));

    println!("✅ Blank query yields the full ranked list");
    Ok(())
}

/// Exactly two tokens resolve to a single post: first token picks the
/// company, second picks its oldest matching post.
#[tokio::test]
async fn test_two_token_query_resolves_single_post() -> Result<()> {
    let db = test_db()?;
    let category = seed_category(&db, "Artificial Intelligence")?;
    let helios = register_company(&db, "Helios Labs")?;
    register_company(&db, "Vantage Pay")?;

    let base = Utc::now();
    let first = publish_post_at(&db, &helios, &category, "Alpha engine", base)?;
    publish_post_at(
        &db,
        &helios,
        &category,
        "Alpha followup",
        base + Duration::minutes(5),
    )?;

    let parsed = search::parse("heli ALPH");
    let (company_fragment, post_fragment) = match parsed {
        ParsedQuery::TwoToken { company, post, .. } => (company, post),
        other => panic!("Expected a two-token parse, got {:?}", other),
    };

    let company = CompanyRepository::new(db.pool.clone())
        .find_by_name_fragment(&company_fragment)?
        .expect("Fragment should match Helios Labs");
    assert_eq!(company.name, "Helios Labs");

    let post = PostRepository::new(db.pool.clone())
        .find_by_title_fragment(&company.id, &post_fragment)?
        .expect("Fragment should match an Alpha post");
    assert_eq!(post.id, first.id, "The oldest matching post wins");
    assert_eq!(post.company_name, "Helios Labs");

    println!("✅ Two-token query resolves company then oldest post");
    Ok(())
}

/// When several company names contain the fragment, the alphabetically
/// first one is chosen.
#[tokio::test]
async fn test_name_fragment_prefers_alphabetical_first() -> Result<()> {
    let db = test_db()?;
    register_company(&db, "Beacon Labs")?;
    register_company(&db, "Alpha Beacon")?;

    let hit = CompanyRepository::new(db.pool.clone())
        .find_by_name_fragment("beacon")?
        .expect("Both names contain the fragment");
    assert_eq!(hit.name, "Alpha Beacon");

    println!("✅ Name fragment resolution is alphabetical");
    Ok(())
}

/// A two-token query whose exact resolution misses falls back to a fuzzy
/// filter over the untouched query string.
#[tokio::test]
async fn test_two_token_miss_falls_back_to_fuzzy() -> Result<()> {
    let db = test_db()?;
    let category = seed_category(&db, "Fintech")?;
    let helios = register_company(&db, "Helios Labs")?;
    publish_post_at(&db, &helios, &category, "Settlement pilot", Utc::now())?;

    let parsed = search::parse("Helios nosuch");
    let (company_fragment, post_fragment, raw) = match parsed {
        ParsedQuery::TwoToken { company, post, raw } => (company, post, raw),
        other => panic!("Expected a two-token parse, got {:?}", other),
    };

    let companies = CompanyRepository::new(db.pool.clone());
    let posts = PostRepository::new(db.pool.clone());

    let company = companies
        .find_by_name_fragment(&company_fragment)?
        .expect("Company side matches");
    assert!(
        posts
            .find_by_title_fragment(&company.id, &post_fragment)?
            .is_none(),
        "Title side should miss"
    );

    // Handler fallback: rank with the raw query as a fuzzy needle
    let ranked = ranking::rank(companies.list_all()?, &posts.list_all()?, Some(&raw));
    assert!(
        ranked.is_empty(),
        "No company name or title contains the whole raw query"
    );

    println!("✅ Failed exact resolution falls back to fuzzy");
    Ok(())
}

/// Fuzzy matching looks at post titles as well as company names.
#[tokio::test]
async fn test_fuzzy_matches_post_titles_too() -> Result<()> {
    let db = test_db()?;
    let category = seed_category(&db, "Developer Tools")?;
    let forgeline = register_company(&db, "Forgeline")?;
    let quietwire = register_company(&db, "Quietwire")?;
    publish_post_at(&db, &forgeline, &category, "Pipelines go public", Utc::now())?;
    publish_post_at(&db, &quietwire, &category, "Status page", Utc::now())?;

    assert_eq!(
        search::parse("pipelines"),
        ParsedQuery::Fuzzy("pipelines".to_string())
    );

    let companies = CompanyRepository::new(db.pool.clone()).list_all()?;
    let posts = PostRepository::new(db.pool.clone()).list_all()?;
    let ranked = ranking::rank(companies, &posts, Some("pipelines"));

    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].company.name, "Forgeline");

    println!("✅ Fuzzy filter reaches into post titles");
    Ok(())
}

/// The combined endpoint's parser is strict: it never degrades into a
/// fuzzy search.
#[tokio::test]
async fn test_combined_query_parses_and_resolves() -> Result<()> {
    let db = test_db()?;
    let category = seed_category(&db, "Artificial Intelligence")?;
    let helios = register_company(&db, "Helios Labs")?;
    let base = Utc::now();
    let first = publish_post_at(&db, &helios, &category, "Alpha engine", base)?;
    publish_post_at(
        &db,
        &helios,
        &category,
        "Alpha followup",
        base + Duration::minutes(5),
    )?;

    let (company_fragment, post_fragment) = search::parse_combined("helios+alpha")
        .expect("Well-formed combined query should parse");
    assert_eq!(company_fragment, "helios");
    assert_eq!(post_fragment, "alpha");

    let company = CompanyRepository::new(db.pool.clone())
        .find_by_name_fragment(&company_fragment)?
        .expect("Company fragment should resolve");
    let post = PostRepository::new(db.pool.clone())
        .find_by_title_fragment(&company.id, &post_fragment)?
        .expect("Post fragment should resolve");
    assert_eq!(post.id, first.id);

    assert_eq!(
        search::parse_combined("no delimiter here"),
        Err(QueryError::MissingDelimiter)
    );
    assert_eq!(search::parse_combined("+alpha"), Err(QueryError::EmptyPart));
    assert_eq!(search::parse_combined("helios+"), Err(QueryError::EmptyPart));

    println!("✅ Combined queries parse strictly and resolve");
    Ok(())
}
