use sqlx::{Postgres, QueryBuilder};

use crate::{
    error::{Error, HttpError},
    form::Form,
    pagination::PageRequest,
    schema::Id,
};

/// Narrowing applied to the recipe listing. Empty or missing parameters match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub authors: Vec<Id>,
    pub tags: Vec<String>,
    pub is_favorited: Option<bool>,
    pub is_in_shopping_cart: Option<bool>,
}

impl RecipeFilter {
    /// Author values that are not ids are skipped.
    pub fn from_form(form: &Form) -> Self {
        let authors = form
            .get_all("author")
            .iter()
            .filter_map(|author| author.trim().parse().ok())
            .collect();
        let tags = form
            .get_all("tags")
            .iter()
            .map(|tag| tag.trim())
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            authors,
            tags,
            is_favorited: form.get_bool("is_favorited"),
            is_in_shopping_cart: form.get_bool("is_in_shopping_cart"),
        }
    }

    /// Pushes ` AND ...` conditions over the annotated recipe relation aliased `r`.
    pub fn push_conditions(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        if !self.authors.is_empty() {
            builder.push(" AND r.author_id = ANY(");
            builder.push_bind(self.authors.clone());
            builder.push(")");
        }
        if !self.tags.is_empty() {
            builder.push(
                " AND EXISTS (SELECT 1 FROM recipe_tags rt INNER JOIN tags t ON t.id = rt.tag_id WHERE rt.recipe_id = r.id AND t.slug = ANY(",
            );
            builder.push_bind(self.tags.clone());
            builder.push("))");
        }
        if let Some(is_favorited) = self.is_favorited {
            builder.push(" AND r.is_favorited = ");
            builder.push_bind(is_favorited);
        }
        if let Some(is_in_shopping_cart) = self.is_in_shopping_cart {
            builder.push(" AND r.is_in_shopping_cart = ");
            builder.push_bind(is_in_shopping_cart);
        }
    }
}

/// Case-insensitive name prefix for the ingredient listing.
pub fn ingredient_prefix(form: &Form) -> Option<&str> {
    form.get_str("name")
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
}

/// Malformed paging values fall back to defaults instead of failing the request.
pub fn page_request(form: &Form) -> PageRequest {
    PageRequest::new(
        form.get_number("page").ok().flatten(),
        form.get_number("limit").ok().flatten(),
    )
}

pub fn recipes_limit(form: &Form) -> Result<Option<i64>, Error> {
    match form.get_number::<i64>("recipes_limit")? {
        Some(limit) if limit < 0 => Err(HttpError::InvalidRequest.new("recipes_limit must not be negative")),
        limit => Ok(limit),
    }
}
