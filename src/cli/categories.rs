use comfy_table::{Cell, Table};

use crate::cli::load_taxonomy;
use crate::error::{Result, SamplerError};
use crate::settings::load_settings;
use crate::taxonomy::Taxonomy;

pub fn list(parent_of: Option<String>, taxonomy: Option<String>) -> Result<()> {
    let settings = load_settings();
    let taxonomy = load_taxonomy(&settings, taxonomy.as_deref())?;
    match parent_of {
        Some(name) => println!("{}", parent_line(&taxonomy, &name)?),
        None => println!("Categories\n{}", category_table(&taxonomy)),
    }
    Ok(())
}

fn parent_line(taxonomy: &Taxonomy, subcategory: &str) -> Result<String> {
    let parent = taxonomy.parent_guid_of_subcategory(subcategory);
    if parent.is_empty() {
        return Err(SamplerError::Other(format!("No subcategory named \"{subcategory}\"")));
    }
    Ok(format!("{subcategory} belongs to {} ({parent})", taxonomy.name_by_guid(parent)))
}

pub(crate) fn category_table(taxonomy: &Taxonomy) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["GUID", "Category", "Subcategories"]);
    for root in taxonomy.root_categories() {
        let subs: Vec<&str> = taxonomy
            .subcategories_of(&root.guid)
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        table.add_row(vec![
            Cell::new(&root.guid),
            Cell::new(&root.name),
            Cell::new(subs.join(", ")),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_lists_every_root() {
        let taxonomy = Taxonomy::builtin().unwrap();
        let rendered = category_table(&taxonomy).to_string();
        for root in taxonomy.root_categories() {
            assert!(rendered.contains(&root.guid), "missing {}", root.guid);
        }
        assert!(rendered.contains("Late Payment Fee"));
    }

    #[test]
    fn test_parent_line_names_the_root() {
        let taxonomy = Taxonomy::builtin().unwrap();
        assert_eq!(
            parent_line(&taxonomy, "Late Payment Fee").unwrap(),
            "Late Payment Fee belongs to Fees and Charges (CAT-00000200)"
        );
    }

    #[test]
    fn test_parent_line_rejects_roots_and_unknown_names() {
        let taxonomy = Taxonomy::builtin().unwrap();
        assert!(parent_line(&taxonomy, "Shopping").is_err());
        let err = parent_line(&taxonomy, "Nope").unwrap_err();
        assert_eq!(err.to_string(), "No subcategory named \"Nope\"");
    }
}
