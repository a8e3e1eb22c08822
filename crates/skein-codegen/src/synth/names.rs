use std::collections::HashSet;

/// Hands out unique identifiers within one namespace
///
/// A name that is already taken gets the smallest numeric suffix that makes
/// it unique, starting at 2, so claims are deterministic in claim order.
#[derive(Debug, Clone, Default)]
pub struct NameRegistry {
    taken: HashSet<String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `names` already taken
    pub fn with_reserved<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            taken: names.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn claim(&mut self, base: &str) -> String {
        if self.taken.insert(base.to_string()) {
            return base.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base}{n}");
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }

    pub fn is_taken(&self, name: &str) -> bool {
        self.taken.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collisions_get_numeric_suffixes() {
        let mut names = NameRegistry::with_reserved(["config"]);
        assert_eq!(names.claim("config"), "config2");
        assert_eq!(names.claim("user"), "user");
        assert_eq!(names.claim("user"), "user2");
        assert_eq!(names.claim("user"), "user3");
        assert!(names.is_taken("user3"));
    }
}
