use crate::db::models::Status;

/// Largest page a client may request from `GET /tickets`.
pub const MAX_PAGE_LIMIT: usize = 100;

/// Page size used when `limit` is not given.
pub const DEFAULT_PAGE_LIMIT: usize = 20;

/// Validated paging and filter arguments for a ticket listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketQuery {
    pub skip: usize,
    pub limit: usize,
    /// `None` means no status filter.
    pub statuses: Option<Vec<Status>>,
}

/// Validate `skip`. Must be a non-negative integer; defaults to 0.
pub fn validate_skip(raw: Option<&str>) -> Result<usize, String> {
    match raw {
        None => Ok(0),
        Some(raw) => parse_non_negative("skip", raw),
    }
}

/// Validate `limit`. Must be an integer in `0..=MAX_PAGE_LIMIT`.
pub fn validate_limit(raw: Option<&str>, default: usize) -> Result<usize, String> {
    let limit = match raw {
        None => return Ok(default.min(MAX_PAGE_LIMIT)),
        Some(raw) => parse_non_negative("limit", raw)?,
    };
    if limit > MAX_PAGE_LIMIT {
        return Err(format!(
            "limit must be less than or equal to {}",
            MAX_PAGE_LIMIT
        ));
    }
    Ok(limit)
}

/// The value a scalar query parameter takes when it is repeated: the last
/// non-empty one. An empty value (`?limit=`) counts as not given.
pub fn last_value(raw: &[String]) -> Option<&str> {
    raw.iter().rev().map(String::as_str).find(|v| !v.is_empty())
}

/// Validate repeated `status` values. Empty values are ignored, and no
/// values at all means no filter.
pub fn validate_statuses(raw: &[String]) -> Result<Option<Vec<Status>>, String> {
    let statuses = raw
        .iter()
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<Status>())
        .collect::<Result<Vec<_>, _>>()?;
    Ok((!statuses.is_empty()).then_some(statuses))
}

/// Validate all listing arguments at once, reporting the first problem.
///
/// Every parameter may be repeated; `skip` and `limit` take their last
/// value.
pub fn validate_ticket_query(
    skip: &[String],
    limit: &[String],
    statuses: &[String],
    default_limit: usize,
) -> Result<TicketQuery, String> {
    Ok(TicketQuery {
        skip: validate_skip(last_value(skip))?,
        limit: validate_limit(last_value(limit), default_limit)?,
        statuses: validate_statuses(statuses)?,
    })
}

fn parse_non_negative(name: &str, raw: &str) -> Result<usize, String> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("{} must be a valid integer", name))?;
    if value < 0 {
        return Err(format!("{} must be greater than or equal to 0", name));
    }
    usize::try_from(value).map_err(|_| format!("{} is too large", name))
}
