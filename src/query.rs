use serde::Deserialize;

/// SQL query builder for constructing parameterized venue queries
/// Builds a single SQL query with filters, sorting, and pagination
pub struct SQLQueryBuilder {
    base_query: String,
    where_clauses: Vec<String>,
    params: Vec<String>,
    order_clause: Option<String>,
    limit: u32,
    offset: u32,
}

impl SQLQueryBuilder {
    /// Creates a new SQLQueryBuilder with default values
    pub fn new() -> Self {
        Self {
            base_query: "SELECT * FROM venues".to_string(),
            where_clauses: Vec::new(),
            params: Vec::new(),
            order_clause: None,
            limit: 20,
            offset: 0,
        }
    }

    /// Adds a free-text filter matching venue name or description
    /// Uses ILIKE for PostgreSQL case-insensitive pattern matching
    pub fn add_search_filter(&mut self, search: &str) {
        let param_index = self.params.len() + 1;
        self.where_clauses.push(format!(
            "(venue_name ILIKE ${0} OR description ILIKE ${0})",
            param_index
        ));
        self.params.push(format!("%{}%", search));
    }

    /// Adds a lifecycle status filter (exact match)
    pub fn add_status_filter(&mut self, status: &str) {
        let param_index = self.params.len() + 1;
        self.where_clauses.push(format!("status = ${}", param_index));
        self.params.push(status.to_string());
    }

    /// Adds a capacity floor filter (inclusive)
    pub fn add_min_capacity(&mut self, min_capacity: u32) {
        let param_index = self.params.len() + 1;
        self.where_clauses
            .push(format!("capacity >= ${}::int4", param_index));
        self.params.push(min_capacity.to_string());
    }

    /// Adds a maximum rate filter: the venue's cheapest tier must not
    /// exceed the bound. Venues without tiers never match.
    pub fn add_max_rate(&mut self, max_rate: &str) {
        let param_index = self.params.len() + 1;
        self.where_clauses.push(format!(
            "id IN (SELECT venue_id FROM price_tiers GROUP BY venue_id \
             HAVING MIN(price) <= ${}::numeric)",
            param_index
        ));
        self.params.push(max_rate.to_string());
    }

    /// Sets the sort order for the query
    pub fn set_sort(&mut self, field: SortField, order: SortOrder) {
        let field_name = match field {
            SortField::Name => "venue_name",
            SortField::Capacity => "capacity",
        };

        let order_str = match order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };

        self.order_clause = Some(format!("{} {}", field_name, order_str));
    }

    /// Sets pagination parameters
    /// Calculates LIMIT and OFFSET based on page number and limit
    pub fn set_pagination(&mut self, page: u32, limit: u32) {
        self.limit = limit;
        self.offset = (page - 1) * limit;
    }

    /// Builds the final SQL query string with all parameters
    /// Returns a tuple of (query_string, parameters)
    pub fn build(&self) -> (String, Vec<String>) {
        let mut query = self.base_query.clone();

        if !self.where_clauses.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&self.where_clauses.join(" AND "));
        }

        if let Some(ref order) = self.order_clause {
            query.push_str(" ORDER BY ");
            query.push_str(order);
        }

        // LIMIT and OFFSET go into the query string directly; PostgreSQL
        // requires integers here, not text parameters
        query.push_str(&format!(" LIMIT {}", self.limit));
        query.push_str(&format!(" OFFSET {}", self.offset));

        (query, self.params.clone())
    }
}

/// Query parameters extracted from HTTP request
/// All fields are optional to support flexible querying
#[derive(Debug, Deserialize)]
pub struct QueryParams {
    /// Free-text search over venue name and description
    pub search: Option<String>,
    /// Filter by lifecycle status ("active" or "inactive")
    pub status: Option<String>,
    /// Capacity floor (inclusive)
    pub min_capacity: Option<u32>,
    /// Maximum rate: cheapest tier price bound (inclusive)
    pub max_rate: Option<f64>,
    /// Sort field: "name" or "capacity"
    pub sort: Option<String>,
    /// Sort order: "asc" or "desc"
    pub order: Option<String>,
    /// Page number (1-indexed, defaults to 1)
    pub page: Option<u32>,
    /// Items per page (defaults to 20)
    pub limit: Option<u32>,
}

/// Sort field options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    Capacity,
}

/// Sort order options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Validated and normalized query parameters
#[derive(Debug)]
pub struct ValidatedQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub min_capacity: Option<u32>,
    pub max_rate: Option<f64>,
    pub sort_field: Option<SortField>,
    pub sort_order: SortOrder,
    pub page: u32,
    pub limit: u32,
}

/// Validation error type
#[derive(Debug)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Query parameter validator
pub struct QueryValidator;

impl QueryValidator {
    /// Validates and normalizes query parameters
    /// Returns ValidatedQuery on success or ValidationError on failure
    pub fn validate(params: QueryParams) -> Result<ValidatedQuery, ValidationError> {
        let search = Self::normalize_string(params.search);

        let status = match Self::normalize_string(params.status) {
            Some(s) => {
                let lowered = s.to_lowercase();
                if lowered != "active" && lowered != "inactive" {
                    return Err(ValidationError {
                        message: format!(
                            "Invalid status '{}'. Must be 'active' or 'inactive'",
                            s
                        ),
                    });
                }
                Some(lowered)
            }
            None => None,
        };

        if let Some(cap) = params.min_capacity {
            if cap == 0 {
                return Err(ValidationError {
                    message: "min_capacity must be a positive number".to_string(),
                });
            }
        }

        let max_rate = if let Some(rate) = params.max_rate {
            Self::validate_rate(rate, "max_rate")?;
            Some(rate)
        } else {
            None
        };

        let sort_field = if let Some(sort_str) = params.sort {
            Some(Self::parse_sort_field(&sort_str)?)
        } else {
            None
        };

        let sort_order = if let Some(order_str) = params.order {
            Self::parse_sort_order(&order_str)?
        } else {
            SortOrder::Asc
        };

        let page = if let Some(p) = params.page {
            Self::validate_pagination_param(p, "page")?;
            p
        } else {
            1
        };

        let limit = if let Some(l) = params.limit {
            Self::validate_pagination_param(l, "limit")?;
            // Bounded page size: requests beyond the cap are clamped
            l.min(100)
        } else {
            20
        };

        Ok(ValidatedQuery {
            search,
            status,
            min_capacity: params.min_capacity,
            max_rate,
            sort_field,
            sort_order,
            page,
            limit,
        })
    }

    /// Normalizes string parameters by trimming whitespace
    /// Returns None if the string is empty or whitespace-only
    fn normalize_string(s: Option<String>) -> Option<String> {
        s.and_then(|s| {
            let trimmed = s.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        })
    }

    /// Validates that a rate bound is positive and finite
    fn validate_rate(rate: f64, param_name: &str) -> Result<(), ValidationError> {
        if rate <= 0.0 {
            return Err(ValidationError {
                message: format!("{} must be a positive number", param_name),
            });
        }
        if rate.is_nan() || rate.is_infinite() {
            return Err(ValidationError {
                message: format!("{} must be a valid number", param_name),
            });
        }
        Ok(())
    }

    /// Parses sort field string to SortField enum
    fn parse_sort_field(s: &str) -> Result<SortField, ValidationError> {
        match s.to_lowercase().as_str() {
            "name" => Ok(SortField::Name),
            "capacity" => Ok(SortField::Capacity),
            _ => Err(ValidationError {
                message: format!("Invalid sort field '{}'. Must be 'name' or 'capacity'", s),
            }),
        }
    }

    /// Parses sort order string to SortOrder enum
    fn parse_sort_order(s: &str) -> Result<SortOrder, ValidationError> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(ValidationError {
                message: format!("Invalid sort order '{}'. Must be 'asc' or 'desc'", s),
            }),
        }
    }

    /// Validates pagination parameters (page and limit)
    fn validate_pagination_param(value: u32, param_name: &str) -> Result<(), ValidationError> {
        if value == 0 {
            return Err(ValidationError {
                message: format!("{} must be a positive number (greater than 0)", param_name),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_builder_basic_query() {
        let builder = SQLQueryBuilder::new();
        let (query, params) = builder.build();

        assert!(query.contains("SELECT * FROM venues"));
        assert!(query.contains("LIMIT 20"));
        assert!(query.contains("OFFSET 0"));
        assert_eq!(params.len(), 0);
    }

    #[test]
    fn test_sql_builder_with_search() {
        let mut builder = SQLQueryBuilder::new();
        builder.add_search_filter("auditorium");
        let (query, params) = builder.build();

        assert!(query.contains("WHERE"));
        assert!(query.contains("venue_name ILIKE $1"));
        assert!(query.contains("description ILIKE $1"));
        assert_eq!(params[0], "%auditorium%");
    }

    #[test]
    fn test_sql_builder_with_capacity_and_rate() {
        let mut builder = SQLQueryBuilder::new();
        builder.add_min_capacity(100);
        builder.add_max_rate("9000");
        let (query, params) = builder.build();

        assert!(query.contains("capacity >= $1::int4"));
        assert!(query.contains("MIN(price) <= $2::numeric"));
        assert_eq!(params[0], "100");
        assert_eq!(params[1], "9000");
    }

    #[test]
    fn test_sql_builder_with_status() {
        let mut builder = SQLQueryBuilder::new();
        builder.add_status_filter("active");
        let (query, params) = builder.build();

        assert!(query.contains("status = $1"));
        assert_eq!(params[0], "active");
    }

    #[test]
    fn test_sql_builder_with_pagination() {
        let mut builder = SQLQueryBuilder::new();
        builder.set_pagination(3, 20);
        let (query, _params) = builder.build();

        assert!(query.contains("LIMIT 20"));
        assert!(query.contains("OFFSET 40"));
    }

    #[test]
    fn test_sql_builder_combined_filters() {
        let mut builder = SQLQueryBuilder::new();
        builder.add_search_filter("hall");
        builder.add_status_filter("active");
        builder.add_min_capacity(50);
        builder.set_sort(SortField::Capacity, SortOrder::Desc);
        builder.set_pagination(1, 10);

        let (query, params) = builder.build();

        assert!(query.contains("WHERE"));
        assert!(query.contains("AND"));
        assert!(query.contains("ORDER BY capacity DESC"));
        assert_eq!(params.len(), 3);
        assert_eq!(params[0], "%hall%");
        assert_eq!(params[1], "active");
        assert_eq!(params[2], "50");
    }

    #[test]
    fn test_validate_defaults() {
        let params = QueryParams {
            search: None,
            status: None,
            min_capacity: None,
            max_rate: None,
            sort: None,
            order: None,
            page: None,
            limit: None,
        };

        let validated = QueryValidator::validate(params).unwrap();
        assert_eq!(validated.page, 1);
        assert_eq!(validated.limit, 20);
        assert_eq!(validated.sort_order, SortOrder::Asc);
    }

    #[test]
    fn test_validate_limit_is_clamped() {
        let params = QueryParams {
            search: None,
            status: None,
            min_capacity: None,
            max_rate: None,
            sort: None,
            order: None,
            page: None,
            limit: Some(500),
        };

        let validated = QueryValidator::validate(params).unwrap();
        assert_eq!(validated.limit, 100);
    }

    #[test]
    fn test_validate_rejects_bad_status() {
        let params = QueryParams {
            search: None,
            status: Some("archived".to_string()),
            min_capacity: None,
            max_rate: None,
            sort: None,
            order: None,
            page: None,
            limit: None,
        };

        assert!(QueryValidator::validate(params).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_min_capacity() {
        let params = QueryParams {
            search: None,
            status: None,
            min_capacity: Some(0),
            max_rate: None,
            sort: None,
            order: None,
            page: None,
            limit: None,
        };

        assert!(QueryValidator::validate(params).is_err());
    }

    #[test]
    fn test_validate_rejects_negative_max_rate() {
        let params = QueryParams {
            search: None,
            status: None,
            min_capacity: None,
            max_rate: Some(-10.0),
            sort: None,
            order: None,
            page: None,
            limit: None,
        };

        assert!(QueryValidator::validate(params).is_err());
    }

    #[test]
    fn test_parse_sort_field() {
        assert_eq!(
            QueryValidator::parse_sort_field("name").unwrap(),
            SortField::Name
        );
        assert_eq!(
            QueryValidator::parse_sort_field("CAPACITY").unwrap(),
            SortField::Capacity
        );
        assert!(QueryValidator::parse_sort_field("rating").is_err());
    }

    #[test]
    fn test_normalize_string() {
        assert_eq!(
            QueryValidator::normalize_string(Some("  hall  ".to_string())),
            Some("hall".to_string())
        );
        assert_eq!(QueryValidator::normalize_string(Some("   ".to_string())), None);
        assert_eq!(QueryValidator::normalize_string(None), None);
    }
}
