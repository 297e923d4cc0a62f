use std::{collections::HashMap, str::FromStr};

use crate::constants::TRUTHY_VALUES;

use super::error::TypeError;

/// Raw query string pairs, in request order. Repeated keys are kept.
pub type FormData = Vec<(String, String)>;

pub struct Form {
    inner: HashMap<String, Vec<String>>,
}

impl Form {
    pub fn from_data(data: FormData) -> Self {
        let mut inner: HashMap<String, Vec<String>> = HashMap::new();
        for (key, value) in data {
            inner.entry(key).or_default().push(value);
        }
        Self { inner }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.inner
            .get(key)
            .and_then(|values| values.first())
            .map(|value| value.as_str())
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.inner.get(key).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn get_number<T>(&self, key: &str) -> Result<Option<T>, TypeError>
    where
        T: FromStr,
    {
        match self.get_str(key) {
            Some(value) => value
                .trim()
                .parse()
                .map(Some)
                .map_err(|_e| TypeError::new(&format!("Invalid number for '{key}'"))),
            None => Ok(None),
        }
    }

    /// Any value outside [`TRUTHY_VALUES`] reads as `false`.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get_str(key).map(|value| {
            let value = value.trim();
            TRUTHY_VALUES
                .iter()
                .any(|truthy| truthy.eq_ignore_ascii_case(value))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> Form {
        Form::from_data(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn repeated_keys_are_collected_in_order() {
        let form = form(&[("tags", "breakfast"), ("name", "x"), ("tags", "lunch")]);
        assert_eq!(form.get_all("tags"), ["breakfast", "lunch"]);
        assert_eq!(form.get_str("tags"), Some("breakfast"));
        assert!(form.get_all("author").is_empty());
    }

    #[test]
    fn booleans_use_a_fixed_vocabulary() {
        for value in ["1", "true", "True", "YES", "on"] {
            assert_eq!(form(&[("flag", value)]).get_bool("flag"), Some(true));
        }
        for value in ["0", "false", "maybe", ""] {
            assert_eq!(form(&[("flag", value)]).get_bool("flag"), Some(false));
        }
        assert_eq!(form(&[]).get_bool("flag"), None);
    }

    #[test]
    fn numbers_are_parsed_or_rejected() {
        let form = form(&[("limit", "3"), ("page", "two")]);
        assert_eq!(form.get_number::<i64>("limit").unwrap(), Some(3));
        assert!(form.get_number::<i64>("page").is_err());
        assert_eq!(form.get_number::<i64>("missing").unwrap(), None);
    }
}
