use std::collections::HashMap;

use lux_types::{Company, Post, RankedCompany};
use uuid::Uuid;

/// Maximum number of entries in the top companies list
pub const TOP_LIST_LIMIT: usize = 100;

/// Minimum aggregate score required for the top companies list
pub const TOP_LIST_MIN_AGGREGATE: f64 = 1.0;

/// Attach aggregate scores to companies and sort them into ranking order.
///
/// The aggregate is the sum of the company's post scores, recomputed from the
/// posts passed in; it lives only for this call and is never persisted. Order
/// is aggregate descending, ties broken by company name ascending. When
/// `query` is present and non-empty the list is filtered case-insensitively:
/// a company survives if the query occurs in its name or in the title of any
/// of its posts.
pub fn rank(companies: Vec<Company>, posts: &[Post], query: Option<&str>) -> Vec<RankedCompany> {
    let mut aggregates: HashMap<Uuid, (f64, usize)> = HashMap::new();
    let mut titles: HashMap<Uuid, Vec<&str>> = HashMap::new();

    for post in posts {
        let entry = aggregates.entry(post.company_id).or_insert((0.0, 0));
        entry.0 += post.score;
        entry.1 += 1;
        titles.entry(post.company_id).or_default().push(&post.title);
    }

    let needle = query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase);

    let mut ranked: Vec<RankedCompany> = companies
        .into_iter()
        .filter(|company| match &needle {
            None => true,
            Some(needle) => {
                company.name.to_lowercase().contains(needle)
                    || titles
                        .get(&company.id)
                        .map(|titles| {
                            titles.iter().any(|t| t.to_lowercase().contains(needle))
                        })
                        .unwrap_or(false)
            }
        })
        .map(|company| {
            let (aggregate, post_count) = aggregates.get(&company.id).copied().unwrap_or((0.0, 0));
            RankedCompany {
                company,
                aggregate,
                post_count,
            }
        })
        .collect();

    sort_ranked(&mut ranked);
    ranked
}

/// The "Top companies by AI" list: companies with aggregate score >= 1,
/// ranked, truncated to the top 100.
pub fn top_companies(companies: Vec<Company>, posts: &[Post]) -> Vec<RankedCompany> {
    let mut ranked = rank(companies, posts, None);
    ranked.retain(|r| r.aggregate >= TOP_LIST_MIN_AGGREGATE);
    ranked.truncate(TOP_LIST_LIMIT);
    ranked
}

/// Aggregate score for a single company's posts
pub fn aggregate_score(posts: &[Post]) -> f64 {
    posts.iter().map(|p| p.score).sum()
}

fn sort_ranked(ranked: &mut [RankedCompany]) {
    ranked.sort_by(|a, b| {
        b.aggregate
            .partial_cmp(&a.aggregate)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.company.name.cmp(&b.company.name))
    });
}
