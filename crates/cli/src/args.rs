use anyhow::{anyhow, Context, Result};
use gobble_core::recipes::ManualRecipeDraft;
use storage::models::{Difficulty, StorageLocation};

/// Parses `INDEX=LOCATION`, e.g. `0=R` or `2=freezer`.
pub fn parse_assignment(raw: &str) -> Result<(usize, StorageLocation)> {
    let (index, location) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected INDEX=LOCATION, got {raw:?}"))?;
    let index = index
        .trim()
        .parse()
        .with_context(|| format!("invalid item index in {raw:?}"))?;
    let location = location.parse::<StorageLocation>().map_err(|e| anyhow!(e))?;
    Ok((index, location))
}

pub fn parse_location(raw: &str) -> Result<StorageLocation> {
    raw.parse().map_err(|e: String| anyhow!(e))
}

/// `All` (any case) means no difficulty filter.
pub fn parse_difficulty_filter(raw: &str) -> Result<Option<Difficulty>> {
    if raw.trim().eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    raw.parse().map(Some).map_err(|e: String| anyhow!(e))
}

/// Fills a manual recipe draft line by line, the way the entry form does.
pub fn manual_draft(
    title: &str,
    ingredients: &[String],
    steps: &[String],
    cook_time: &str,
    servings: &str,
    difficulty: Option<&str>,
) -> Result<ManualRecipeDraft> {
    let mut draft = ManualRecipeDraft {
        title: title.to_string(),
        cook_time: cook_time.to_string(),
        ..Default::default()
    };
    for (i, line) in ingredients.iter().enumerate() {
        if i > 0 {
            draft.add_ingredient();
        }
        draft.set_ingredient(i, line.as_str())?;
    }
    for (i, line) in steps.iter().enumerate() {
        if i > 0 {
            draft.add_step();
        }
        draft.set_step(i, line.as_str())?;
    }
    draft.set_servings(servings);
    draft.difficulty = match difficulty {
        Some(raw) => parse_difficulty_filter(raw)?,
        None => None,
    };
    Ok(draft)
}
