use std::collections::BTreeMap;

use crate::{constants::SHOPPING_CART_HEADER, schema::ShoppingListRow};

/// Orders lines by name ignoring case, then by the exact name and unit.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct LineKey {
    folded: String,
    name: String,
    unit: String,
}

/// Cart contents summed per (ingredient name, unit).
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ShoppingList {
    totals: BTreeMap<LineKey, i64>,
}

impl ShoppingList {
    pub fn from_rows(rows: Vec<ShoppingListRow>) -> Self {
        let mut totals: BTreeMap<LineKey, i64> = BTreeMap::new();
        for row in rows {
            let key = LineKey {
                folded: row.name.to_lowercase(),
                name: row.name,
                unit: row.measurement_unit,
            };
            *totals.entry(key).or_default() += i64::from(row.amount);
        }
        Self { totals }
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn render(&self) -> String {
        let lines = self
            .totals
            .iter()
            .map(|(key, total)| format!("{} - {total}/{}", key.name, key.unit))
            .collect::<Vec<_>>()
            .join("\n");

        format!("{SHOPPING_CART_HEADER}{lines}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, unit: &str, amount: i32) -> ShoppingListRow {
        ShoppingListRow {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        }
    }

    #[test]
    fn amounts_from_different_recipes_are_summed() {
        let list = ShoppingList::from_rows(vec![row("sugar", "g", 100), row("sugar", "g", 50)]);
        assert_eq!(list.render(), format!("{SHOPPING_CART_HEADER}sugar - 150/g"));
    }

    #[test]
    fn units_are_kept_apart_and_lines_are_sorted() {
        let list = ShoppingList::from_rows(vec![
            row("sugar", "tbsp", 2),
            row("flour", "g", 300),
            row("sugar", "g", 10),
        ]);
        assert_eq!(
            list.render(),
            format!("{SHOPPING_CART_HEADER}flour - 300/g\nsugar - 10/g\nsugar - 2/tbsp")
        );
    }

    #[test]
    fn capitalised_names_sort_alongside_lowercase_ones() {
        let list = ShoppingList::from_rows(vec![
            row("Cherry", "g", 1),
            row("banana", "pcs", 2),
            row("Apple", "pcs", 3),
        ]);
        assert_eq!(
            list.render(),
            format!("{SHOPPING_CART_HEADER}Apple - 3/pcs\nbanana - 2/pcs\nCherry - 1/g")
        );
    }

    #[test]
    fn empty_cart_renders_only_the_header() {
        let list = ShoppingList::from_rows(vec![]);
        assert!(list.is_empty());
        assert_eq!(list.render(), SHOPPING_CART_HEADER);
    }
}
