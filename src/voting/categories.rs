use serde::Serialize;

/// $1 per vote.
pub const VOTE_PRICE_CENTS: i64 = 100;
pub const MAX_VOTES_PER_CHECKOUT: i32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Category {
    pub slug: &'static str,
    pub name: &'static str,
}

/// Display order on cards, vote pages and the leaderboard.
pub const CATEGORIES: &[Category] = &[
    Category { slug: "army", name: "Army" },
    Category { slug: "navy", name: "Navy" },
    Category { slug: "air-force", name: "Air Force" },
    Category { slug: "marines", name: "Marines" },
    Category { slug: "coast-guard", name: "Coast Guard" },
    Category { slug: "space-force", name: "Space Force" },
    Category { slug: "peoples-choice", name: "People’s Choice" },
];

pub fn by_slug(slug: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|c| c.slug == slug)
}

pub fn parse_vote_qty(raw: &str) -> Result<i32, &'static str> {
    let qty: i32 = raw.trim().parse().map_err(|_| "Invalid vote quantity.")?;
    if !(1..=MAX_VOTES_PER_CHECKOUT).contains(&qty) {
        return Err("Vote quantity must be between 1 and 50.");
    }
    Ok(qty)
}
