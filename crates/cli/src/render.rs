//! Plain-text rendering for terminal output.

use gobble_core::inventory::{Freshness, InventoryView, ItemCard};
use gobble_core::review::ParsedCandidateItem;
use std::fmt::Write as _;
use storage::models::Recipe;

const CARD_WIDTH: usize = 24;

fn freshness_label(f: Freshness) -> &'static str {
    match f {
        Freshness::Critical => "critical",
        Freshness::Warning => "warning",
        Freshness::Caution => "caution",
        Freshness::Fair => "fair",
        Freshness::Fresh => "fresh",
        Freshness::Unknown => "-",
    }
}

fn fit(s: &str, width: usize) -> String {
    let count = s.chars().count();
    if count <= width {
        format!("{s:<width$}")
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('~');
        out
    }
}

fn days_label(card: &ItemCard) -> String {
    match card.days_left {
        Some(d) if d < 0 => format!("{} days ago", -d),
        Some(1) => "1 day".to_string(),
        Some(d) => format!("{d} days"),
        None => String::new(),
    }
}

/// One text block per grid row; each card spans three lines.
pub fn inventory_grid(view: &InventoryView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({} items)", view.mode.label(), view.len());
    if view.is_empty() {
        let _ = writeln!(out, "  nothing stored here yet");
        return out;
    }
    for row in &view.rows {
        let lines: [Vec<String>; 3] = [
            row.iter().map(|c| fit(&c.name, CARD_WIDTH)).collect(),
            row.iter()
                .map(|c| fit(&format!("exp {}", c.expiration_label()), CARD_WIDTH))
                .collect(),
            row.iter()
                .map(|c| {
                    let text = format!("{} {}", freshness_label(c.freshness), days_label(c));
                    fit(text.trim_end(), CARD_WIDTH)
                })
                .collect(),
        ];
        for line in lines {
            let _ = writeln!(out, "  {}", line.join(" | ").trim_end());
        }
        out.push('\n');
    }
    out
}

/// Home-screen style list of items running out soon.
pub fn expiring(cards: &[ItemCard], days: i64) -> String {
    let mut out = String::new();
    if cards.is_empty() {
        let _ = writeln!(out, "nothing expires within {days} days");
        return out;
    }
    let _ = writeln!(out, "Expiring within {days} days:");
    for card in cards {
        let _ = writeln!(
            out,
            "  {} (exp {}, {})",
            card.name,
            card.expiration_label(),
            days_label(card)
        );
    }
    out
}

pub fn candidates(items: &[ParsedCandidateItem]) -> String {
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        let storage = item
            .storage_option
            .map(|s| s.code())
            .unwrap_or("?");
        let expiration = item
            .effective_expiration()
            .unwrap_or_else(|| "N/A".to_string());
        let _ = write!(out, "{i:>3}. [{storage}] {} (exp {expiration})", item.name);
        if let Some(price) = item.price {
            let _ = write!(out, " ${price:.2}");
        }
        out.push('\n');
    }
    out
}

pub fn recipe(recipe: &Recipe) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", recipe.title);
    let difficulty = recipe
        .difficulty
        .map(|d| d.to_string())
        .unwrap_or_else(|| "-".to_string());
    let _ = writeln!(
        out,
        "{} | {} servings | {}",
        if recipe.cook_time.is_empty() { "-" } else { recipe.cook_time.as_str() },
        recipe.servings,
        difficulty
    );
    if let Some(url) = &recipe.url {
        let _ = writeln!(out, "{url}");
    }
    let _ = writeln!(out, "\nIngredients:");
    for i in &recipe.ingredients {
        let _ = writeln!(out, "  - {i}");
    }
    let _ = writeln!(out, "\nSteps:");
    for (n, s) in recipe.steps.iter().enumerate() {
        let _ = writeln!(out, "  {}. {s}", n + 1);
    }
    out
}
