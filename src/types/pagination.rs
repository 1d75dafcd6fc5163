use handle_errors::Error;
use std::collections::HashMap;

/// Pagination extracted from the query parameters of `/questions`.
#[derive(Default, Debug, PartialEq)]
pub struct Pagination {
    /// Maximum number of questions to return; `None` returns all of them.
    pub limit: Option<i64>,
    /// Number of questions to skip.
    pub offset: i64,
}

/// Extract pagination parameters from the `/questions` route.
/// # Example query
/// GET requests to this route can have pagination attached so we just
/// return the questions we need
/// `/questions?limit=10&offset=20`
/// # Example usage
/// ```rust
/// use std::collections::HashMap;
/// use qna_board::types::pagination::extract_pagination;
///
/// let mut query = HashMap::new();
/// query.insert("limit".to_string(), "1".to_string());
/// query.insert("offset".to_string(), "10".to_string());
/// let p = extract_pagination(query).unwrap();
/// assert_eq!(p.limit, Some(1));
/// assert_eq!(p.offset, 10);
/// ```
pub fn extract_pagination(params: HashMap<String, String>) -> Result<Pagination, Error> {
    match (params.get("limit"), params.get("offset")) {
        (Some(limit), Some(offset)) => Ok(Pagination {
            limit: Some(limit.parse::<u32>().map_err(Error::ParseError)? as i64),
            offset: offset.parse::<u32>().map_err(Error::ParseError)? as i64,
        }),
        _ => Err(Error::MissingParameters),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn both_parameters_are_required() {
        assert!(matches!(
            extract_pagination(query(&[("limit", "5")])),
            Err(Error::MissingParameters)
        ));
    }

    #[test]
    fn negative_values_do_not_parse() {
        assert!(matches!(
            extract_pagination(query(&[("limit", "-1"), ("offset", "0")])),
            Err(Error::ParseError(_))
        ));
    }

    #[test]
    fn valid_parameters() {
        assert_eq!(
            extract_pagination(query(&[("limit", "5"), ("offset", "15")])).unwrap(),
            Pagination {
                limit: Some(5),
                offset: 15
            }
        );
    }
}
