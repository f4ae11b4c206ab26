use std::collections::{HashMap, HashSet};
use std::path::Path;

use rand::Rng;
use tracing::info;

use crate::error::{Result, SamplerError};
use crate::models::{Category, CategoryAssignment, FEES_AND_CHARGES, UNCATEGORIZED};

pub const UNCATEGORIZED_GUID: &str = "CAT-00000100";

const BUILTIN_CATEGORIES: &str = include_str!("../data/categories.json");

/// Two-level category forest. Built once by [`Taxonomy::from_categories`]
/// and read-only afterwards, so it can be shared across threads behind an `Arc`.
#[derive(Debug)]
pub struct Taxonomy {
    categories: Vec<Category>,
    by_guid: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
    children: HashMap<String, Vec<usize>>,
    /// Roots excluding the Uncategorized sentinel.
    roots: Vec<usize>,
}

impl Taxonomy {
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_CATEGORIES)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let taxonomy = Self::from_json(&content)?;
        info!(path = %path.display(), categories = taxonomy.len(), "loaded taxonomy");
        Ok(taxonomy)
    }

    /// Load from the configured path, or the built-in taxonomy when none is set.
    pub fn load_or_builtin(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) => Self::load(Path::new(p)),
            None => Self::builtin(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let categories: Vec<Category> = serde_json::from_str(json)?;
        Self::from_categories(categories)
    }

    pub fn from_categories(categories: Vec<Category>) -> Result<Self> {
        let mut by_guid = HashMap::with_capacity(categories.len());
        for (i, cat) in categories.iter().enumerate() {
            if cat.guid.trim().is_empty() {
                return Err(SamplerError::MissingField { index: i, field: "categoryGUID" });
            }
            if cat.name.trim().is_empty() {
                return Err(SamplerError::MissingField { index: i, field: "category" });
            }
            if by_guid.insert(cat.guid.clone(), i).is_some() {
                return Err(SamplerError::DuplicateCategory(cat.guid.clone()));
            }
        }

        let sentinel = by_guid
            .get(UNCATEGORIZED_GUID)
            .map(|&i| &categories[i])
            .ok_or(SamplerError::MissingSentinel(UNCATEGORIZED_GUID))?;
        if sentinel.name != UNCATEGORIZED || !sentinel.is_root() {
            return Err(SamplerError::InvalidSentinel(sentinel.guid.clone()));
        }

        let mut children: HashMap<String, Vec<usize>> = HashMap::new();
        let mut roots = Vec::new();
        for (i, cat) in categories.iter().enumerate() {
            if cat.is_root() {
                if cat.guid != UNCATEGORIZED_GUID {
                    roots.push(i);
                }
                continue;
            }
            let parent = by_guid
                .get(&cat.parent_guid)
                .map(|&p| &categories[p])
                .ok_or_else(|| SamplerError::DanglingParent {
                    guid: cat.guid.clone(),
                    parent: cat.parent_guid.clone(),
                })?;
            if !parent.is_root() {
                return Err(SamplerError::NestedSubcategory {
                    guid: cat.guid.clone(),
                    parent: cat.parent_guid.clone(),
                });
            }
            children.entry(cat.parent_guid.clone()).or_default().push(i);
        }

        if !roots.iter().any(|&i| categories[i].name != FEES_AND_CHARGES) {
            return Err(SamplerError::NoPurchaseCategories);
        }

        // Roots win name collisions; otherwise the first subcategory with a name wins.
        let mut by_name = HashMap::with_capacity(categories.len());
        let mut claimed_by_root = HashSet::new();
        for (i, cat) in categories.iter().enumerate() {
            if cat.is_root() {
                by_name.insert(cat.name.clone(), i);
                claimed_by_root.insert(cat.name.clone());
            } else if !claimed_by_root.contains(&cat.name) {
                by_name.entry(cat.name.clone()).or_insert(i);
            }
        }

        Ok(Self { categories, by_guid, by_name, children, roots })
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn category(&self, guid: &str) -> Option<&Category> {
        self.by_guid.get(guid).map(|&i| &self.categories[i])
    }

    pub fn guid_by_name(&self, name: &str) -> &str {
        self.by_name
            .get(name)
            .map(|&i| self.categories[i].guid.as_str())
            .unwrap_or(UNCATEGORIZED_GUID)
    }

    pub fn name_by_guid(&self, guid: &str) -> &str {
        self.category(guid).map(|c| c.name.as_str()).unwrap_or(UNCATEGORIZED)
    }

    pub fn subcategories_of(&self, parent_guid: &str) -> Vec<&Category> {
        self.children
            .get(parent_guid)
            .map(|ids| ids.iter().map(|&i| &self.categories[i]).collect())
            .unwrap_or_default()
    }

    /// Parent GUID of the first subcategory with this name, empty if none.
    pub fn parent_guid_of_subcategory(&self, name: &str) -> &str {
        self.categories
            .iter()
            .find(|c| !c.is_root() && c.name == name)
            .map(|c| c.parent_guid.as_str())
            .unwrap_or("")
    }

    /// All roots, the sentinel first.
    pub fn root_categories(&self) -> Vec<&Category> {
        let mut out = Vec::with_capacity(self.roots.len() + 1);
        if let Some(sentinel) = self.category(UNCATEGORIZED_GUID) {
            out.push(sentinel);
        }
        out.extend(self.roots.iter().map(|&i| &self.categories[i]));
        out
    }

    pub fn random_subcategory<R: Rng + ?Sized>(&self, parent_guid: &str, rng: &mut R) -> &str {
        match self.children.get(parent_guid) {
            Some(ids) if !ids.is_empty() => self.categories[ids[rng.gen_range(0..ids.len())]].guid.as_str(),
            _ => UNCATEGORIZED_GUID,
        }
    }

    /// Uniform pick among roots other than Uncategorized.
    pub fn random_root_category<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        if self.roots.is_empty() {
            return UNCATEGORIZED_GUID;
        }
        self.categories[self.roots[rng.gen_range(0..self.roots.len())]].guid.as_str()
    }

    /// Category triple for a subcategory drawn under `root_guid`.
    pub fn assign_under<R: Rng + ?Sized>(&self, root_guid: &str, rng: &mut R) -> CategoryAssignment {
        let sub_guid = self.random_subcategory(root_guid, rng);
        CategoryAssignment {
            category: self.name_by_guid(root_guid).to_string(),
            sub_category: self.name_by_guid(sub_guid).to_string(),
            category_guid: sub_guid.to_string(),
        }
    }

    pub fn uncategorized(&self) -> CategoryAssignment {
        CategoryAssignment {
            category: UNCATEGORIZED.to_string(),
            sub_category: UNCATEGORIZED.to_string(),
            category_guid: UNCATEGORIZED_GUID.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn cat(guid: &str, name: &str, parent: &str) -> Category {
        Category {
            guid: guid.to_string(),
            name: name.to_string(),
            parent_guid: parent.to_string(),
        }
    }

    fn small() -> Vec<Category> {
        vec![
            cat(UNCATEGORIZED_GUID, UNCATEGORIZED, ""),
            cat("CAT-1", FEES_AND_CHARGES, ""),
            cat("CAT-1a", "Late Payment Fee", "CAT-1"),
            cat("CAT-2", "Shopping", ""),
            cat("CAT-2a", "Grocery", "CAT-2"),
            cat("CAT-2b", "Books", "CAT-2"),
            cat("CAT-3", "Charity", ""),
        ]
    }

    #[test]
    fn test_builtin_taxonomy_loads() {
        let t = Taxonomy::builtin().unwrap();
        assert!(t.len() > 50);
        let fees = t.guid_by_name(FEES_AND_CHARGES);
        let subs: Vec<&str> = t.subcategories_of(fees).iter().map(|c| c.name.as_str()).collect();
        assert_eq!(subs, vec!["Card Payment", "Returns", "Late Payment Fee", "Annual Fee & Charges"]);
        assert!(t.subcategories_of(UNCATEGORIZED_GUID).is_empty());
    }

    #[test]
    fn test_lookups_fall_back_to_uncategorized() {
        let t = Taxonomy::from_categories(small()).unwrap();
        assert_eq!(t.guid_by_name("Shopping"), "CAT-2");
        assert_eq!(t.guid_by_name("Nope"), UNCATEGORIZED_GUID);
        assert_eq!(t.name_by_guid("CAT-2b"), "Books");
        assert_eq!(t.name_by_guid("CAT-404"), UNCATEGORIZED);
        assert!(t.subcategories_of("CAT-404").is_empty());
        assert_eq!(t.parent_guid_of_subcategory("Grocery"), "CAT-2");
        assert_eq!(t.parent_guid_of_subcategory("Shopping"), "");
    }

    #[test]
    fn test_root_name_wins_over_subcategory() {
        let t = Taxonomy::builtin().unwrap();
        let guid = t.guid_by_name("Insurance");
        assert!(t.category(guid).unwrap().is_root());
        let guid = t.guid_by_name("Travel");
        assert!(t.category(guid).unwrap().is_root());
    }

    #[test]
    fn test_random_subcategory_stays_under_parent() {
        let t = Taxonomy::from_categories(small()).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let g = t.random_subcategory("CAT-2", &mut rng);
            assert!(g == "CAT-2a" || g == "CAT-2b");
        }
        assert_eq!(t.random_subcategory("CAT-3", &mut rng), UNCATEGORIZED_GUID);
    }

    #[test]
    fn test_random_root_never_uncategorized() {
        let t = Taxonomy::from_categories(small()).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = HashSet::new();
        for _ in 0..200 {
            let g = t.random_root_category(&mut rng);
            assert_ne!(g, UNCATEGORIZED_GUID);
            seen.insert(g.to_string());
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_root_categories_lists_sentinel_first() {
        let t = Taxonomy::from_categories(small()).unwrap();
        let names: Vec<&str> = t.root_categories().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec![UNCATEGORIZED, FEES_AND_CHARGES, "Shopping", "Charity"]);
    }

    #[test]
    fn test_duplicate_guid_rejected() {
        let mut cats = small();
        cats.push(cat("CAT-2a", "Again", "CAT-2"));
        assert!(matches!(
            Taxonomy::from_categories(cats),
            Err(SamplerError::DuplicateCategory(g)) if g == "CAT-2a"
        ));
    }

    #[test]
    fn test_dangling_parent_rejected() {
        let mut cats = small();
        cats.push(cat("CAT-9a", "Orphan", "CAT-9"));
        assert!(matches!(Taxonomy::from_categories(cats), Err(SamplerError::DanglingParent { .. })));
    }

    #[test]
    fn test_third_level_rejected() {
        let mut cats = small();
        cats.push(cat("CAT-2a-i", "Produce", "CAT-2a"));
        assert!(matches!(Taxonomy::from_categories(cats), Err(SamplerError::NestedSubcategory { .. })));
    }

    #[test]
    fn test_missing_or_misnamed_sentinel_rejected() {
        let cats: Vec<Category> = small().into_iter().skip(1).collect();
        assert!(matches!(Taxonomy::from_categories(cats), Err(SamplerError::MissingSentinel(_))));

        let mut cats = small();
        cats[0].name = "Other".to_string();
        assert!(matches!(Taxonomy::from_categories(cats), Err(SamplerError::InvalidSentinel(_))));
    }

    #[test]
    fn test_requires_a_purchase_root() {
        let cats = vec![
            cat(UNCATEGORIZED_GUID, UNCATEGORIZED, ""),
            cat("CAT-1", FEES_AND_CHARGES, ""),
        ];
        assert!(matches!(Taxonomy::from_categories(cats), Err(SamplerError::NoPurchaseCategories)));
    }

    #[test]
    fn test_missing_json_field_fails() {
        let json = r#"[{"categoryGUID": "CAT-00000100", "category": "Uncategorized"}]"#;
        assert!(matches!(Taxonomy::from_json(json), Err(SamplerError::Json(_))));

        let json = r#"[{"categoryGUID": "", "category": "X", "parentCategoryGUID": ""}]"#;
        assert!(matches!(Taxonomy::from_json(json), Err(SamplerError::MissingField { index: 0, .. })));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("categories.json");
        std::fs::write(&path, serde_json::to_string(&small()).unwrap()).unwrap();
        let t = Taxonomy::load(&path).unwrap();
        assert_eq!(t.len(), 7);

        let missing = dir.path().join("missing.json");
        assert!(matches!(Taxonomy::load(&missing), Err(SamplerError::Io(_))));
    }
}
