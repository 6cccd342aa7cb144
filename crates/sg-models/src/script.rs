//! Generated scripts, produced by step 2.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The intro plus per-slot hook scripts, already integrated per slot.
///
/// `individual` has exactly `N` entries (`movie1`..`movieN`), not `N+1`:
/// the intro is folded into `movie1` (see `Movie::slot_name` / spec
/// intro-integration invariant).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptBundle {
    pub intro: String,
    pub hooks: Vec<String>,
    pub combined: String,
    pub individual: BTreeMap<String, String>,
}

impl ScriptBundle {
    /// Build a bundle from a sanitized intro and hooks, applying the
    /// intro-integration invariant.
    pub fn assemble(intro: String, hooks: Vec<String>) -> Self {
        let mut individual = BTreeMap::new();
        for (idx, hook) in hooks.iter().enumerate() {
            let slot = format!("movie{}", idx + 1);
            if idx == 0 {
                individual.insert(slot, format!("{} {}", intro, hook));
            } else {
                individual.insert(slot, hook.clone());
            }
        }

        let mut combined_parts = vec![intro.clone()];
        combined_parts.extend(hooks.iter().cloned());
        let combined = combined_parts.join("\n\n");

        Self {
            intro,
            hooks,
            combined,
            individual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intro_is_folded_into_movie1_only() {
        let bundle = ScriptBundle::assemble(
            "Get ready for the best horror hits on Netflix.".to_string(),
            vec![
                "This movie proves horror fans are obsessed.".to_string(),
                "A twenty six word hook that satisfies the timing band for movie two exactly as required here now.".to_string(),
                "Another twenty six word hook that satisfies the timing band for movie three exactly as required here now.".to_string(),
            ],
        );

        assert_eq!(bundle.individual.len(), 3);
        assert_eq!(
            bundle.individual["movie1"],
            "Get ready for the best horror hits on Netflix. This movie proves horror fans are obsessed."
        );
        assert_eq!(bundle.individual["movie2"], bundle.hooks[1]);
        assert_eq!(bundle.individual["movie3"], bundle.hooks[2]);
    }
}
