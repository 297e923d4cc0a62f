use std::collections::HashSet;

use serde::Deserialize;

use crate::{
    constants::{
        INGREDIENT_NAME_MAX_LENGTH, MEASUREMENT_UNIT_MAX_LENGTH, RECIPE_NAME_MAX_LENGTH,
        TAG_NAME_MAX_LENGTH, TAG_SLUG_MAX_LENGTH,
    },
    error::{Error, HttpError},
    schema::{
        Id, ImageData, IngredientWrite, NewIngredient, NewRecipe, NewTag, RecipeRelations,
        RecipeUpdate,
    },
    serializers::decode_base64_image,
};

#[derive(Debug, Clone, Deserialize)]
pub struct IngredientPayload {
    pub id: Id,
    pub amount: i64,
}

/// Recipe write body. Every field is optional here so that missing fields
/// surface as validation errors in a fixed order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipePayload {
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i64>,
    pub tags: Option<Vec<Id>>,
    pub ingredients: Option<Vec<IngredientPayload>>,
    pub image: Option<String>,
}

/// Ids that exist in storage, looked up once per request.
#[derive(Debug, Clone, Default)]
pub struct KnownIds {
    pub ingredients: HashSet<Id>,
    pub tags: HashSet<Id>,
}

fn invalid(info: &str) -> Error {
    HttpError::InvalidRequest.new(info)
}

/// Referenced ingredient ids, checked before any storage lookup.
pub fn ingredient_ids(payload: &RecipePayload) -> Result<Vec<Id>, Error> {
    let ingredients = payload
        .ingredients
        .as_ref()
        .ok_or_else(|| invalid("ingredients: This field is required"))?;
    if ingredients.is_empty() {
        return Err(invalid("ingredients: At least one ingredient is required"));
    }
    Ok(ingredients.iter().map(|i| i.id).collect())
}

fn validate_ingredients(
    ingredients: &[IngredientPayload],
    known: &HashSet<Id>,
) -> Result<Vec<IngredientWrite>, Error> {
    if ingredients.is_empty() {
        return Err(invalid("ingredients: At least one ingredient is required"));
    }

    let mut seen = HashSet::with_capacity(ingredients.len());
    let mut writes = Vec::with_capacity(ingredients.len());
    for ingredient in ingredients {
        if !known.contains(&ingredient.id) {
            return Err(HttpError::NotFound.new(&format!(
                "ingredients: Ingredient {} does not exist",
                ingredient.id
            )));
        }
        if !seen.insert(ingredient.id) {
            return Err(invalid(&format!(
                "ingredients: Ingredient {} is listed more than once",
                ingredient.id
            )));
        }
        if ingredient.amount < 1 {
            return Err(invalid("ingredients: Amount must be at least 1"));
        }
        let amount = i32::try_from(ingredient.amount)
            .map_err(|_| invalid("ingredients: Amount is too large"))?;
        writes.push(IngredientWrite {
            id: ingredient.id,
            amount,
        });
    }
    Ok(writes)
}

fn validate_cooking_time(cooking_time: i64) -> Result<i32, Error> {
    if cooking_time < 1 {
        return Err(invalid("cooking_time: Cooking time must be at least 1"));
    }
    i32::try_from(cooking_time).map_err(|_| invalid("cooking_time: Cooking time is too large"))
}

fn validate_name(name: &str) -> Result<String, Error> {
    let name = name.trim();
    if name.is_empty() {
        return Err(invalid("name: This field may not be blank"));
    }
    if name.chars().count() > RECIPE_NAME_MAX_LENGTH {
        return Err(invalid(&format!(
            "name: Ensure this field has no more than {RECIPE_NAME_MAX_LENGTH} characters"
        )));
    }
    Ok(name.to_string())
}

fn validate_text(text: &str) -> Result<String, Error> {
    if text.trim().is_empty() {
        return Err(invalid("text: This field may not be blank"));
    }
    Ok(text.to_string())
}

fn validate_tags(tags: &[Id], known: &HashSet<Id>) -> Result<Vec<Id>, Error> {
    let mut seen = HashSet::with_capacity(tags.len());
    let mut ids = Vec::with_capacity(tags.len());
    for &tag in tags {
        if !known.contains(&tag) {
            return Err(invalid(&format!("tags: Tag {tag} does not exist")));
        }
        if seen.insert(tag) {
            ids.push(tag);
        }
    }
    Ok(ids)
}

fn validate_image(image: &str) -> Result<ImageData, Error> {
    Ok(decode_base64_image(image)?)
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, Error> {
    value.ok_or_else(|| invalid(&format!("{field}: This field is required")))
}

pub fn validate_new_recipe(payload: RecipePayload, known: &KnownIds) -> Result<NewRecipe, Error> {
    let ingredients = required(payload.ingredients, "ingredients")?;
    let ingredients = validate_ingredients(&ingredients, &known.ingredients)?;
    let cooking_time = validate_cooking_time(required(payload.cooking_time, "cooking_time")?)?;
    let name = validate_name(&required(payload.name, "name")?)?;
    let text = validate_text(&required(payload.text, "text")?)?;
    let tags = validate_tags(&payload.tags.unwrap_or_default(), &known.tags)?;
    let image = validate_image(&required(payload.image, "image")?)?;

    Ok(NewRecipe {
        name,
        text,
        cooking_time,
        image,
        relations: RecipeRelations { tags, ingredients },
    })
}

/// Associations are always replaced, so `ingredients` and `tags` are required.
pub fn validate_recipe_update(
    payload: RecipePayload,
    known: &KnownIds,
) -> Result<RecipeUpdate, Error> {
    let ingredients = required(payload.ingredients, "ingredients")?;
    let ingredients = validate_ingredients(&ingredients, &known.ingredients)?;
    let cooking_time = payload.cooking_time.map(validate_cooking_time).transpose()?;
    let name = payload.name.as_deref().map(validate_name).transpose()?;
    let text = payload.text.as_deref().map(validate_text).transpose()?;
    let tags = validate_tags(&required(payload.tags, "tags")?, &known.tags)?;
    let image = payload.image.as_deref().map(validate_image).transpose()?;

    Ok(RecipeUpdate {
        name,
        text,
        cooking_time,
        image,
        relations: RecipeRelations { tags, ingredients },
    })
}

fn bounded(value: &str, field: &str, max: usize) -> Result<String, Error> {
    let value = value.trim();
    if value.is_empty() {
        return Err(invalid(&format!("{field}: This field may not be blank")));
    }
    if value.chars().count() > max {
        return Err(invalid(&format!(
            "{field}: Ensure this field has no more than {max} characters"
        )));
    }
    Ok(value.to_string())
}

fn is_hex_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

pub fn validate_new_tag(tag: NewTag) -> Result<NewTag, Error> {
    let name = bounded(&tag.name, "name", TAG_NAME_MAX_LENGTH)?;
    let slug = bounded(&tag.slug, "slug", TAG_SLUG_MAX_LENGTH)?;
    if !slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(invalid("slug: Only letters, digits, '-' and '_' are allowed"));
    }
    let color = tag.color.trim().to_uppercase();
    if !is_hex_color(&color) {
        return Err(invalid("color: Expected a #RRGGBB color"));
    }

    Ok(NewTag { name, color, slug })
}

pub fn validate_new_ingredient(ingredient: NewIngredient) -> Result<NewIngredient, Error> {
    Ok(NewIngredient {
        name: bounded(&ingredient.name, "name", INGREDIENT_NAME_MAX_LENGTH)?,
        measurement_unit: bounded(
            &ingredient.measurement_unit,
            "measurement_unit",
            MEASUREMENT_UNIT_MAX_LENGTH,
        )?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known() -> KnownIds {
        KnownIds {
            ingredients: HashSet::from([1, 2, 3]),
            tags: HashSet::from([10, 11]),
        }
    }

    fn payload() -> RecipePayload {
        RecipePayload {
            name: Some(String::from("Pancakes")),
            text: Some(String::from("Whisk and fry")),
            cooking_time: Some(15),
            tags: Some(vec![10]),
            ingredients: Some(vec![
                IngredientPayload { id: 1, amount: 200 },
                IngredientPayload { id: 2, amount: 1 },
            ]),
            image: Some(String::from("data:image/png;base64,aGVsbG8=")),
        }
    }

    fn code(result: Result<NewRecipe, Error>) -> u16 {
        result.unwrap_err().code
    }

    #[test]
    fn valid_payload_becomes_a_new_recipe() {
        let recipe = validate_new_recipe(payload(), &known()).unwrap();

        assert_eq!(recipe.name, "Pancakes");
        assert_eq!(recipe.cooking_time, 15);
        assert_eq!(recipe.relations.tags, vec![10]);
        assert_eq!(
            recipe.relations.ingredients,
            vec![
                IngredientWrite { id: 1, amount: 200 },
                IngredientWrite { id: 2, amount: 1 }
            ]
        );
        assert_eq!(recipe.image.bytes, b"hello");
    }

    #[test]
    fn empty_ingredient_list_is_rejected_before_lookup() {
        let mut body = payload();
        body.ingredients = Some(vec![]);

        assert_eq!(ingredient_ids(&body).unwrap_err().code, 400);
        assert_eq!(code(validate_new_recipe(body, &known())), 400);
        assert_eq!(ingredient_ids(&payload()).unwrap(), vec![1, 2]);
    }

    #[test]
    fn unknown_ingredient_is_not_found() {
        let mut body = payload();
        body.ingredients = Some(vec![IngredientPayload { id: 42, amount: 1 }]);
        assert_eq!(code(validate_new_recipe(body, &known())), 404);
    }

    #[test]
    fn duplicate_ingredient_is_rejected_regardless_of_other_fields() {
        let mut body = payload();
        body.ingredients = Some(vec![
            IngredientPayload { id: 1, amount: 5 },
            IngredientPayload { id: 1, amount: 7 },
        ]);
        body.cooking_time = Some(0);
        body.name = None;

        let error = validate_new_recipe(body, &known()).unwrap_err();
        assert_eq!(error.code, 400);
        assert!(error.message().contains("more than once"));
    }

    #[test]
    fn amount_and_cooking_time_boundaries() {
        let mut body = payload();
        body.ingredients = Some(vec![IngredientPayload { id: 3, amount: 0 }]);
        assert_eq!(code(validate_new_recipe(body, &known())), 400);

        let mut body = payload();
        body.cooking_time = Some(0);
        assert_eq!(code(validate_new_recipe(body, &known())), 400);

        let mut body = payload();
        body.ingredients = Some(vec![IngredientPayload { id: 3, amount: 1 }]);
        body.cooking_time = Some(1);
        assert!(validate_new_recipe(body, &known()).is_ok());
    }

    #[test]
    fn text_fields_and_tags_are_checked() {
        let mut body = payload();
        body.name = Some(String::from("   "));
        assert_eq!(code(validate_new_recipe(body, &known())), 400);

        let mut body = payload();
        body.name = Some("x".repeat(RECIPE_NAME_MAX_LENGTH + 1));
        assert_eq!(code(validate_new_recipe(body, &known())), 400);

        let mut body = payload();
        body.text = Some(String::new());
        assert_eq!(code(validate_new_recipe(body, &known())), 400);

        let mut body = payload();
        body.tags = Some(vec![10, 99]);
        assert_eq!(code(validate_new_recipe(body, &known())), 400);

        let mut body = payload();
        body.tags = None;
        assert!(validate_new_recipe(body, &known())
            .unwrap()
            .relations
            .tags
            .is_empty());
    }

    #[test]
    fn image_is_required_on_create() {
        let mut body = payload();
        body.image = None;
        assert_eq!(code(validate_new_recipe(body, &known())), 400);

        let mut body = payload();
        body.image = Some(String::from("not base64!"));
        assert_eq!(code(validate_new_recipe(body, &known())), 400);
    }

    #[test]
    fn updates_keep_absent_scalars_but_require_associations() {
        let body = RecipePayload {
            tags: Some(vec![]),
            ingredients: Some(vec![IngredientPayload { id: 2, amount: 3 }]),
            ..Default::default()
        };
        let update = validate_recipe_update(body, &known()).unwrap();
        assert_eq!(update.name, None);
        assert_eq!(update.image, None);
        assert_eq!(update.relations.ingredients, vec![IngredientWrite { id: 2, amount: 3 }]);

        let body = RecipePayload {
            ingredients: Some(vec![IngredientPayload { id: 2, amount: 3 }]),
            ..Default::default()
        };
        assert_eq!(validate_recipe_update(body, &known()).unwrap_err().code, 400);
    }

    #[test]
    fn catalog_entries_are_normalized() {
        let tag = validate_new_tag(NewTag {
            name: String::from(" Breakfast "),
            color: String::from("#e26c2d"),
            slug: String::from("breakfast"),
        })
        .unwrap();
        assert_eq!(tag.name, "Breakfast");
        assert_eq!(tag.color, "#E26C2D");

        assert!(validate_new_tag(NewTag {
            name: String::from("Lunch"),
            color: String::from("green"),
            slug: String::from("lunch"),
        })
        .is_err());
        assert!(validate_new_tag(NewTag {
            name: String::from("Lunch"),
            color: String::from("#00FF00"),
            slug: String::from("lunch time"),
        })
        .is_err());

        assert!(validate_new_ingredient(NewIngredient {
            name: String::from("sugar"),
            measurement_unit: String::new(),
        })
        .is_err());
    }
}
