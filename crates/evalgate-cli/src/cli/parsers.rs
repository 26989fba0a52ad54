use evalgate_core::models::CommentMode;

/// Empty input keeps the default `update` mode.
pub(crate) fn parse_comment_mode(raw: Option<&str>) -> std::result::Result<CommentMode, String> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(CommentMode::Update),
        Some(value) => CommentMode::parse(value),
    }
}

pub(crate) fn parse_pr_number(raw: Option<&str>) -> std::result::Result<Option<u64>, String> {
    let Some(value) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    let number = value
        .trim_start_matches('#')
        .parse::<u64>()
        .map_err(|_| format!("invalid pull request number '{value}'"))?;
    if number == 0 {
        return Err("pull request number must be >= 1".to_string());
    }
    Ok(Some(number))
}
