pub const RECIPE_COUNT_PER_PAGE: i64 = 6;
pub const MAX_COUNT_PER_PAGE: i64 = 100;

pub const SESSION_COOKIE: &str = "session";
pub const SESSION_LIFETIME_HOURS: i64 = 24;

pub const BODY_SIZE_LIMIT: u64 = 1024 * 1024 * 16;

pub const SHOPPING_CART_FILENAME: &str = "shopping_cart.txt";
pub const SHOPPING_CART_HEADER: &str = "Мой список покупок:\n\nНаименование - Кол-во/Ед.изм.\n";

/// Query values accepted as `true` by boolean filters, compared case-insensitively.
pub const TRUTHY_VALUES: &[&str] = &["1", "true", "yes", "on"];

pub const RECIPE_NAME_MAX_LENGTH: usize = 255;
pub const TAG_NAME_MAX_LENGTH: usize = 50;
pub const TAG_SLUG_MAX_LENGTH: usize = 50;
pub const INGREDIENT_NAME_MAX_LENGTH: usize = 150;
pub const MEASUREMENT_UNIT_MAX_LENGTH: usize = 50;
