use storage::models::Recipe;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookingPhase {
    /// Gathering ingredients.
    Prep,
    /// Zero-based index into the recipe steps.
    Cooking { step: usize },
    Done,
}

/// Checklist walk through a recipe: gather ingredients, then follow steps.
#[derive(Debug, Clone)]
pub struct CookingSession {
    recipe: Recipe,
    gathered: Vec<bool>,
    phase: CookingPhase,
}

impl CookingSession {
    pub fn new(recipe: Recipe) -> Self {
        let gathered = vec![false; recipe.ingredients.len()];
        Self {
            recipe,
            gathered,
            phase: CookingPhase::Prep,
        }
    }

    pub fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    pub fn phase(&self) -> CookingPhase {
        self.phase
    }

    /// Returns the new check state, or `None` for an unknown index or outside prep.
    pub fn toggle_ingredient(&mut self, index: usize) -> Option<bool> {
        if self.phase != CookingPhase::Prep {
            return None;
        }
        let slot = self.gathered.get_mut(index)?;
        *slot = !*slot;
        Some(*slot)
    }

    pub fn is_gathered(&self, index: usize) -> bool {
        self.gathered.get(index).copied().unwrap_or(false)
    }

    /// `(gathered, total)` ingredients.
    pub fn prep_progress(&self) -> (usize, usize) {
        (
            self.gathered.iter().filter(|g| **g).count(),
            self.gathered.len(),
        )
    }

    pub fn start_cooking(&mut self) {
        if self.phase == CookingPhase::Prep {
            self.phase = if self.recipe.steps.is_empty() {
                CookingPhase::Done
            } else {
                CookingPhase::Cooking { step: 0 }
            };
        }
    }

    pub fn current_step(&self) -> Option<&str> {
        match self.phase {
            CookingPhase::Cooking { step } => self.recipe.steps.get(step).map(String::as_str),
            _ => None,
        }
    }

    /// Advances within bounds; stays on the last step.
    pub fn next_step(&mut self) {
        if let CookingPhase::Cooking { step } = self.phase {
            if step + 1 < self.recipe.steps.len() {
                self.phase = CookingPhase::Cooking { step: step + 1 };
            }
        }
    }

    pub fn previous_step(&mut self) {
        if let CookingPhase::Cooking { step } = self.phase {
            self.phase = CookingPhase::Cooking {
                step: step.saturating_sub(1),
            };
        }
    }

    pub fn finish(&mut self) {
        if matches!(self.phase, CookingPhase::Cooking { .. }) {
            self.phase = CookingPhase::Done;
        }
    }

    pub fn restart(&mut self) {
        self.gathered.iter_mut().for_each(|g| *g = false);
        self.phase = CookingPhase::Prep;
    }

    /// One-based `(step, total)` while cooking.
    pub fn step_progress(&self) -> Option<(usize, usize)> {
        match self.phase {
            CookingPhase::Cooking { step } => Some((step + 1, self.recipe.steps.len())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipes::sample_recipe;

    #[test]
    fn walks_prep_then_steps_within_bounds() {
        let mut session = CookingSession::new(sample_recipe());
        assert_eq!(session.toggle_ingredient(0), Some(true));
        assert_eq!(session.toggle_ingredient(2), Some(true));
        assert_eq!(session.toggle_ingredient(2), Some(false));
        assert_eq!(session.toggle_ingredient(99), None);
        assert_eq!(session.prep_progress(), (1, 9));

        session.start_cooking();
        assert_eq!(session.toggle_ingredient(1), None);
        session.previous_step();
        assert_eq!(session.step_progress(), Some((1, 9)));
        for _ in 0..20 {
            session.next_step();
        }
        assert_eq!(session.step_progress(), Some((9, 9)));
        assert!(session.current_step().unwrap().starts_with("Cool"));

        session.finish();
        assert_eq!(session.phase(), CookingPhase::Done);
        session.restart();
        assert_eq!(session.phase(), CookingPhase::Prep);
        assert_eq!(session.prep_progress(), (0, 9));
    }

    #[test]
    fn recipe_without_steps_goes_straight_to_done() {
        let mut session = CookingSession::new(Recipe::empty());
        session.start_cooking();
        assert_eq!(session.phase(), CookingPhase::Done);
        assert_eq!(session.current_step(), None);
    }
}
