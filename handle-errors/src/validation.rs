use serde::Serialize;
use std::collections::BTreeMap;

/// Why a single field was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    Required,
    InvalidChoice(String),
    NotANumber,
    TooLong { max: usize },
    BelowMinimum { min: i64 },
    AboveMaximum { max: i64 },
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            FieldError::Required => write!(f, "This field is required."),
            FieldError::InvalidChoice(value) => write!(
                f,
                "Select a valid choice. {} is not one of the available choices.",
                value
            ),
            FieldError::NotANumber => write!(f, "Enter a whole number."),
            FieldError::TooLong { max } => {
                write!(f, "Ensure this value has at most {} characters.", max)
            }
            FieldError::BelowMinimum { min } => {
                write!(f, "Ensure this value is greater than or equal to {}.", min)
            }
            // upper bounds are exclusive
            FieldError::AboveMaximum { max } => {
                write!(f, "Ensure this value is less than {}.", max)
            }
        }
    }
}

/// Every field that failed validation, at most one reason per field.
///
/// Fields are kept in name order so responses and logs are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<&'static str, FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `error` for `field` unless the field already failed.
    pub fn add(&mut self, field: &'static str, error: FieldError) {
        self.errors.entry(field).or_insert(error);
    }

    /// Adds every error of `other` for fields not already reported.
    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, error) in other.errors {
            self.add(field, error);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, field: &str) -> Option<&FieldError> {
        self.errors.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldError)> {
        self.errors.iter().map(|(field, error)| (*field, error))
    }

    /// `Ok(value)` when nothing failed, the collected errors otherwise.
    pub fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut first = true;
        for (field, error) in self.iter() {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field, error)?;
            first = false;
        }
        Ok(())
    }
}

impl Serialize for ValidationErrors {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.errors.len()))?;
        for (field, error) in self.iter() {
            map.serialize_entry(field, &error.to_string())?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_error_for_a_field_wins() {
        let mut errors = ValidationErrors::new();
        errors.add("book_page", FieldError::NotANumber);
        errors.add("book_page", FieldError::Required);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("book_page"), Some(&FieldError::NotANumber));
    }

    #[test]
    fn merge_keeps_existing_reasons() {
        let mut parsed = ValidationErrors::new();
        parsed.add("subject", FieldError::NotANumber);

        let mut rules = ValidationErrors::new();
        rules.add("subject", FieldError::Required);
        rules.add("grade", FieldError::Required);

        parsed.merge(rules);

        assert_eq!(parsed.get("subject"), Some(&FieldError::NotANumber));
        assert_eq!(parsed.get("grade"), Some(&FieldError::Required));
    }

    #[test]
    fn display_lists_fields_in_order() {
        let mut errors = ValidationErrors::new();
        errors.add("title", FieldError::Required);
        errors.add("book_page", FieldError::BelowMinimum { min: 0 });

        assert_eq!(
            errors.to_string(),
            "book_page: Ensure this value is greater than or equal to 0.; title: This field is required."
        );
    }

    #[test]
    fn into_result_is_ok_only_without_errors() {
        assert_eq!(ValidationErrors::new().into_result(7), Ok(7));

        let mut errors = ValidationErrors::new();
        errors.add("grade", FieldError::InvalidChoice("GRADE13".to_string()));
        assert!(errors.into_result(7).is_err());
    }
}
